use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A `ProgressCounter` tracks how far a long-running operation has gotten. It is cheap to clone and can be incremented from multiple threads at once, so it can be handed to rayon workers while the owner polls it.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> Self {
		Self {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}

	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}

	/// Return the completed fraction in [0, 1]. A counter with a total of zero reports 1.0.
	pub fn fraction(&self) -> f32 {
		if self.total == 0 {
			return 1.0;
		}
		self.get() as f32 / self.total as f32
	}
}

#[cfg(test)]
mod test {
	use super::ProgressCounter;

	#[test]
	fn test_progress_counter() {
		let counter = ProgressCounter::new(4);
		assert_eq!(counter.get(), 0);
		counter.inc(1);
		counter.inc(2);
		assert_eq!(counter.get(), 3);
		assert!(f32::abs(counter.fraction() - 0.75) < f32::EPSILON);
		counter.inc(1);
		assert!(f32::abs(counter.fraction() - 1.0) < f32::EPSILON);
	}
}
