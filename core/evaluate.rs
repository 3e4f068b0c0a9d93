use crate::pipeline::TrainedPipeline;
use crate::split::{label_ids, DateSplit};
use anyhow::Result;
use failcast_dataframe::{Column, DataFrame};
use failcast_metrics::{
	auc_roc, compute_roc_curve, ClassificationReport, MeanVariance, RocCurvePoint,
	StreamingMetric,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// The validation metrics for one trained pipeline. Training accuracy is included so overfitting shows up next to the number that matters.
#[derive(Debug)]
pub struct EvaluateOutput {
	pub accuracy_train: f32,
	pub accuracy_val: f32,
	pub auc_roc: f32,
	pub roc_curve: Vec<RocCurvePoint>,
	pub report: ClassificationReport,
}

/// Evaluate a trained pipeline on a chronological split: accuracy on both sides, and the ROC curve, AUC, and classification report on the validation side.
pub fn evaluate(pipeline: &TrainedPipeline, split: &DateSplit) -> Result<EvaluateOutput> {
	let labels_train = label_ids(&split.labels_train)?;
	let labels_val = label_ids(&split.labels_val)?;
	let accuracy_train = pipeline.score(&split.features_train.records, &labels_train)?;
	let accuracy_val = pipeline.score(&split.features_val.records, &labels_val)?;
	let probabilities = pipeline.predict_proba(&split.features_val.records)?;
	let predictions: Vec<usize> = probabilities
		.iter()
		.map(|probability| if *probability >= 0.5 { 1 } else { 0 })
		.collect();
	let roc_curve = compute_roc_curve(&probabilities, &labels_val);
	let auc_roc = auc_roc(&probabilities, &labels_val);
	let report = ClassificationReport::compute(&labels_val, &predictions, &pipeline.classes);
	Ok(EvaluateOutput {
		accuracy_train,
		accuracy_val,
		auc_roc,
		roc_curve,
		report,
	})
}

/// These are the options passed to `compute_permutation_importances`.
#[derive(Debug, Clone)]
pub struct PermutationImportanceOptions {
	/// How many times each column is reshuffled. More repeats tighten the standard deviation at the cost of extra predictions.
	pub n_repeats: usize,
	/// The seed for the shuffles.
	pub seed: u64,
}

impl Default for PermutationImportanceOptions {
	fn default() -> Self {
		Self {
			n_repeats: 5,
			seed: 42,
		}
	}
}

/// The permutation importance of one input column: the mean and standard deviation, across repeats, of the accuracy lost when the column's values are shuffled.
#[derive(Debug, Clone)]
pub struct PermutationImportance {
	pub feature_name: String,
	pub mean_importance: f32,
	pub std_importance: f32,
}

/**
Compute the permutation importance of every input column. For each column the values are shuffled in place, breaking the relation between that column and the target while keeping its marginal distribution, and the importance is the drop in accuracy relative to the unshuffled score. Columns the model never relies on score near zero.

Importances are reported per input column, not per one hot encoded feature, so a categorical column's options are shuffled as a unit.
*/
pub fn compute_permutation_importances(
	pipeline: &TrainedPipeline,
	features: &DataFrame,
	labels: &[usize],
	options: &PermutationImportanceOptions,
) -> Result<Vec<PermutationImportance>> {
	let baseline = pipeline.score(features, labels)?;
	let mut rng = Xoshiro256Plus::seed_from_u64(options.seed);
	let mut features = features.clone();
	let mut importances = Vec::with_capacity(features.ncols());
	for column_index in 0..features.ncols() {
		let original = features.columns[column_index].clone();
		let mut metric = MeanVariance::new();
		for _ in 0..options.n_repeats {
			shuffle_column(&mut features.columns[column_index], &mut rng);
			let score = pipeline.score(&features, labels)?;
			metric.update(baseline - score);
		}
		features.columns[column_index] = original;
		let (mean_importance, variance) = metric.finalize();
		importances.push(PermutationImportance {
			feature_name: features.columns[column_index].name().to_owned(),
			mean_importance,
			std_importance: variance.sqrt(),
		});
	}
	Ok(importances)
}

fn shuffle_column(column: &mut Column, rng: &mut Xoshiro256Plus) {
	match column {
		Column::Unknown(_) => {}
		Column::Number(column) => column.data.shuffle(rng),
		Column::Enum(column) => column.data.shuffle(rng),
		Column::Text(column) => column.data.shuffle(rng),
	}
}
