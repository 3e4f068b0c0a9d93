/// The accuracy is the proportion of examples where the predicted label equals the true label.
pub fn accuracy(labels: &[usize], predictions: &[usize]) -> f32 {
	assert_eq!(labels.len(), predictions.len());
	if labels.is_empty() {
		return 0.0;
	}
	let n_correct = labels
		.iter()
		.zip(predictions.iter())
		.filter(|(label, prediction)| label == prediction)
		.count();
	n_correct as f32 / labels.len() as f32
}
