//! https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Welford's_online_algorithm

use super::StreamingMetric;

/// A `MeanVariance` computes the mean and population variance of a stream of values in one pass.
#[derive(Debug, Clone, Default)]
pub struct MeanVariance {
	n: u64,
	mean: f64,
	m2: f64,
}

impl MeanVariance {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StreamingMetric for MeanVariance {
	type Input = f32;
	/// The output is `(mean, variance)`.
	type Output = (f32, f32);

	fn update(&mut self, input: Self::Input) {
		let input = input as f64;
		self.n += 1;
		let delta = input - self.mean;
		self.mean += delta / self.n as f64;
		let delta_2 = input - self.mean;
		self.m2 += delta * delta_2;
	}

	fn merge(&mut self, other: Self) {
		if other.n == 0 {
			return;
		}
		if self.n == 0 {
			*self = other;
			return;
		}
		let n = self.n + other.n;
		let delta = other.mean - self.mean;
		self.mean = (self.n as f64 * self.mean + other.n as f64 * other.mean) / n as f64;
		self.m2 += other.m2 + delta * delta * (self.n as f64 * other.n as f64 / n as f64);
		self.n = n;
	}

	fn finalize(self) -> Self::Output {
		if self.n == 0 {
			return (0.0, 0.0);
		}
		(self.mean as f32, (self.m2 / self.n as f64) as f32)
	}
}
