/// A `ClassificationReport` summarizes predicted versus true labels at a fixed threshold: precision, recall, f1-score and support for each class, plus accuracy and macro and weighted averages. Its `Display` impl renders the standard four column text layout.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
	pub classes: Vec<ClassMetrics>,
	pub accuracy: f32,
	pub macro_avg: AverageMetrics,
	pub weighted_avg: AverageMetrics,
	pub n_examples: usize,
}

#[derive(Debug, Clone)]
pub struct ClassMetrics {
	pub class_name: String,
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
	/// The number of true examples of this class.
	pub support: usize,
}

#[derive(Debug, Clone)]
pub struct AverageMetrics {
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
}

impl ClassificationReport {
	/// Compute the report from true labels and predicted labels, both coded as indexes into `class_names`.
	pub fn compute(labels: &[usize], predictions: &[usize], class_names: &[String]) -> Self {
		assert_eq!(labels.len(), predictions.len());
		let n_classes = class_names.len();
		let mut true_positives = vec![0usize; n_classes];
		let mut predicted_counts = vec![0usize; n_classes];
		let mut supports = vec![0usize; n_classes];
		let mut n_correct = 0;
		for (label, prediction) in labels.iter().zip(predictions.iter()) {
			supports[*label] += 1;
			predicted_counts[*prediction] += 1;
			if label == prediction {
				true_positives[*label] += 1;
				n_correct += 1;
			}
		}
		let classes: Vec<ClassMetrics> = class_names
			.iter()
			.enumerate()
			.map(|(class_index, class_name)| {
				let precision =
					ratio(true_positives[class_index], predicted_counts[class_index]);
				let recall = ratio(true_positives[class_index], supports[class_index]);
				let f1_score = if precision + recall > 0.0 {
					2.0 * precision * recall / (precision + recall)
				} else {
					0.0
				};
				ClassMetrics {
					class_name: class_name.clone(),
					precision,
					recall,
					f1_score,
					support: supports[class_index],
				}
			})
			.collect();
		let n_examples = labels.len();
		let accuracy = ratio(n_correct, n_examples);
		let n_classes_f32 = n_classes as f32;
		let macro_avg = AverageMetrics {
			precision: classes.iter().map(|c| c.precision).sum::<f32>() / n_classes_f32,
			recall: classes.iter().map(|c| c.recall).sum::<f32>() / n_classes_f32,
			f1_score: classes.iter().map(|c| c.f1_score).sum::<f32>() / n_classes_f32,
		};
		let weighted_avg = AverageMetrics {
			precision: weighted(&classes, |c| c.precision, n_examples),
			recall: weighted(&classes, |c| c.recall, n_examples),
			f1_score: weighted(&classes, |c| c.f1_score, n_examples),
		};
		Self {
			classes,
			accuracy,
			macro_avg,
			weighted_avg,
			n_examples,
		}
	}
}

fn ratio(numerator: usize, denominator: usize) -> f32 {
	if denominator == 0 {
		return 0.0;
	}
	numerator as f32 / denominator as f32
}

fn weighted(classes: &[ClassMetrics], value: impl Fn(&ClassMetrics) -> f32, n: usize) -> f32 {
	if n == 0 {
		return 0.0;
	}
	classes
		.iter()
		.map(|c| value(c) * c.support as f32)
		.sum::<f32>()
		/ n as f32
}

impl std::fmt::Display for ClassificationReport {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let name_width = self
			.classes
			.iter()
			.map(|c| c.class_name.len())
			.chain(std::iter::once("weighted avg".len()))
			.max()
			.unwrap_or(0);
		writeln!(
			f,
			"{:>name_width$} {:>10} {:>9} {:>9} {:>9}",
			"",
			"precision",
			"recall",
			"f1-score",
			"support",
			name_width = name_width
		)?;
		writeln!(f)?;
		for class in self.classes.iter() {
			writeln!(
				f,
				"{:>name_width$} {:>10.2} {:>9.2} {:>9.2} {:>9}",
				class.class_name,
				class.precision,
				class.recall,
				class.f1_score,
				class.support,
				name_width = name_width
			)?;
		}
		writeln!(f)?;
		writeln!(
			f,
			"{:>name_width$} {:>10} {:>9} {:>9.2} {:>9}",
			"accuracy",
			"",
			"",
			self.accuracy,
			self.n_examples,
			name_width = name_width
		)?;
		for (name, avg) in &[
			("macro avg", &self.macro_avg),
			("weighted avg", &self.weighted_avg),
		] {
			writeln!(
				f,
				"{:>name_width$} {:>10.2} {:>9.2} {:>9.2} {:>9}",
				name,
				avg.precision,
				avg.recall,
				avg.f1_score,
				self.n_examples,
				name_width = name_width
			)?;
		}
		Ok(())
	}
}
