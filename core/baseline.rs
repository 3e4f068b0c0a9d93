use std::collections::BTreeMap;

/// Compute the accuracy of always predicting the most frequent class. A trained model has to beat this number to be worth anything.
pub fn baseline_accuracy(labels: &[usize]) -> f32 {
	if labels.is_empty() {
		return 0.0;
	}
	let mut histogram = BTreeMap::new();
	for label in labels.iter() {
		*histogram.entry(*label).or_insert(0usize) += 1;
	}
	let max_count = histogram.values().max().cloned().unwrap_or(0);
	max_count as f32 / labels.len() as f32
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_baseline_accuracy() {
		assert_eq!(baseline_accuracy(&[0, 0, 0, 1]), 0.75);
		assert_eq!(baseline_accuracy(&[1, 1, 0, 0]), 0.5);
		assert_eq!(baseline_accuracy(&[1]), 1.0);
		assert_eq!(baseline_accuracy(&[]), 0.0);
	}
}
