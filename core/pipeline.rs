use crate::progress::TrainProgress;
use anyhow::{bail, format_err, Result};
use failcast_dataframe::{ColumnType, DataFrame, EnumColumn};
use failcast_features::{
	compute_feature_groups, compute_features, FeatureGroup, MeanImputer,
};
use failcast_metrics::accuracy;
use failcast_tree::{
	GradientBoostingClassifier, GradientBoostingOptions, RandomForestClassifier,
	RandomForestOptions,
};
use failcast_util::ProgressCounter;
use itertools::izip;
use ndarray::prelude::*;

/// How the pipeline treats missing number features before the model sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum ImputeStrategy {
	/// Leave NaN values in place. The gradient boosting trees route them natively.
	None,
	/// Replace NaN values with the per feature means learned on the training split.
	Mean,
}

/// Which tree ensemble the pipeline trains.
#[derive(Debug, Clone)]
pub enum ModelConfig {
	RandomForest(RandomForestOptions),
	GradientBoosting(GradientBoostingOptions),
}

/// A `PipelineConfig` pairs an imputation strategy with a model. The two stock configurations differ on purpose: bagging imputes because averaging probability trees has no native missing value handling to lean on, while boosting leaves NaN alone.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
	pub impute: ImputeStrategy,
	pub model: ModelConfig,
}

impl PipelineConfig {
	/// One hot encoding, mean imputation, and a random forest.
	pub fn bagging() -> Self {
		Self {
			impute: ImputeStrategy::Mean,
			model: ModelConfig::RandomForest(RandomForestOptions::default()),
		}
	}

	/// One hot encoding and gradient boosting, with no imputation.
	pub fn boosting() -> Self {
		Self {
			impute: ImputeStrategy::None,
			model: ModelConfig::GradientBoosting(GradientBoostingOptions::default()),
		}
	}
}

/// The name and type of one column the pipeline was trained on, recorded so inference can reject inputs whose shape silently drifted from training.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
	pub name: String,
	pub column_type: ColumnType,
}

#[derive(Debug, Clone)]
pub enum TrainedModel {
	RandomForest(RandomForestClassifier),
	GradientBoosting(GradientBoostingClassifier),
}

/**
A `TrainedPipeline` holds everything learned from the training split: the column schema, the feature groups, the fitted imputer if the configuration called for one, the tree ensemble, and the class names of the target.

There is no untrained counterpart to this type. `train` is the only way to get one, so a pipeline that exists can always predict.
*/
#[derive(Debug, Clone)]
pub struct TrainedPipeline {
	pub schema: Vec<ColumnSchema>,
	pub feature_groups: Vec<FeatureGroup>,
	pub imputer: Option<MeanImputer>,
	pub model: TrainedModel,
	/// The names of the two classes, in label id order, so class 0 is `classes[0]`.
	pub classes: Vec<String>,
}

/// Train a pipeline on a feature dataframe and a binary enum label column. Progress is reported through `update_progress`, first while featurizing and then once per tree or boosting round.
pub fn train(
	features: &DataFrame,
	labels: &EnumColumn,
	config: &PipelineConfig,
	update_progress: &mut dyn FnMut(TrainProgress),
) -> Result<TrainedPipeline> {
	if labels.options.len() != 2 {
		bail!(
			"label column \"{}\" has {} classes, expected exactly 2",
			labels.name,
			labels.options.len()
		);
	}
	if features.nrows() != labels.data.len() {
		bail!(
			"features have {} rows but there are {} labels",
			features.nrows(),
			labels.data.len()
		);
	}
	let label_ids = crate::split::label_ids(labels)?;
	let schema = features
		.columns
		.iter()
		.map(|column| ColumnSchema {
			name: column.name().to_owned(),
			column_type: column.column_type(),
		})
		.collect();
	let feature_groups = compute_feature_groups(features)?;
	let progress_counter =
		ProgressCounter::new((features.nrows() * feature_groups.len()) as u64);
	update_progress(TrainProgress::ComputingFeatures(progress_counter.clone()));
	let mut feature_matrix = compute_features(features, &feature_groups, &|| {
		progress_counter.inc(1)
	})?;
	let imputer = match config.impute {
		ImputeStrategy::None => None,
		ImputeStrategy::Mean => {
			let imputer = MeanImputer::fit(feature_matrix.view());
			imputer.transform(&mut feature_matrix);
			Some(imputer)
		}
	};
	let model = match &config.model {
		ModelConfig::RandomForest(options) => {
			let progress_counter = ProgressCounter::new(options.n_trees as u64);
			update_progress(TrainProgress::TrainingModel(progress_counter.clone()));
			TrainedModel::RandomForest(RandomForestClassifier::train(
				feature_matrix.view(),
				&label_ids,
				options,
				&progress_counter,
			))
		}
		ModelConfig::GradientBoosting(options) => {
			let progress_counter = ProgressCounter::new(options.n_rounds as u64);
			update_progress(TrainProgress::TrainingModel(progress_counter.clone()));
			TrainedModel::GradientBoosting(GradientBoostingClassifier::train(
				feature_matrix.view(),
				&label_ids,
				options,
				&progress_counter,
			))
		}
	};
	Ok(TrainedPipeline {
		schema,
		feature_groups,
		imputer,
		model,
		classes: labels.options.clone(),
	})
}

impl TrainedPipeline {
	/// Verify that the input dataframe has the same columns, types, and enum options the pipeline was trained on.
	fn check_schema(&self, features: &DataFrame) -> Result<()> {
		for column_schema in self.schema.iter() {
			let column = features.column(&column_schema.name).ok_or_else(|| {
				format_err!(
					"column \"{}\" was present in training but is missing from the input",
					column_schema.name
				)
			})?;
			if column.column_type() != column_schema.column_type {
				bail!(
					"column \"{}\" does not have the type it had in training",
					column_schema.name
				);
			}
		}
		Ok(())
	}

	fn compute_feature_matrix(&self, features: &DataFrame) -> Result<Array2<f32>> {
		self.check_schema(features)?;
		let mut feature_matrix = compute_features(features, &self.feature_groups, &|| {})?;
		if let Some(imputer) = &self.imputer {
			imputer.transform(&mut feature_matrix);
		}
		Ok(feature_matrix)
	}

	/// Return the positive class probability for each row.
	pub fn predict_proba(&self, features: &DataFrame) -> Result<Vec<f32>> {
		let feature_matrix = self.compute_feature_matrix(features)?;
		Ok(match &self.model {
			TrainedModel::RandomForest(model) => model.predict_proba(feature_matrix.view()),
			TrainedModel::GradientBoosting(model) => model.predict_proba(feature_matrix.view()),
		})
	}

	/// Return the predicted label id for each row at the 0.5 probability threshold.
	pub fn predict(&self, features: &DataFrame) -> Result<Vec<usize>> {
		let feature_matrix = self.compute_feature_matrix(features)?;
		Ok(match &self.model {
			TrainedModel::RandomForest(model) => model.predict(feature_matrix.view()),
			TrainedModel::GradientBoosting(model) => model.predict(feature_matrix.view()),
		})
	}

	/// Return the accuracy of the pipeline's predictions against the given label ids.
	pub fn score(&self, features: &DataFrame, labels: &[usize]) -> Result<f32> {
		let predictions = self.predict(features)?;
		Ok(accuracy(labels, &predictions))
	}

	/// Return the name of each feature the model trains on, in feature matrix order.
	pub fn feature_names(&self) -> Vec<String> {
		self.feature_groups
			.iter()
			.flat_map(|feature_group| feature_group.feature_names())
			.collect()
	}

	/// Return the model's split based importance of each feature, paired with its name.
	pub fn feature_importances(&self) -> Vec<(String, f32)> {
		let importances = match &self.model {
			TrainedModel::RandomForest(model) => &model.feature_importances,
			TrainedModel::GradientBoosting(model) => &model.feature_importances,
		};
		izip!(self.feature_names(), importances.iter().cloned()).collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use failcast_dataframe::{Column, NumberColumn};
	use std::num::NonZeroUsize;

	fn training_data() -> (DataFrame, EnumColumn) {
		let n = 60;
		let mut score = NumberColumn::new("score".to_owned());
		let mut risk = EnumColumn::new(
			"risk".to_owned(),
			vec!["Low".to_owned(), "High".to_owned()],
		);
		let mut labels = EnumColumn::new(
			"outcome".to_owned(),
			vec!["Pass".to_owned(), "Fail".to_owned()],
		);
		for i in 0..n {
			let x = i as f32 / n as f32;
			score.data.push(if i % 13 == 0 { f32::NAN } else { x });
			risk.data.push(if i % 2 == 0 {
				NonZeroUsize::new(1)
			} else {
				NonZeroUsize::new(2)
			});
			labels
				.data
				.push(if x > 0.5 { NonZeroUsize::new(2) } else { NonZeroUsize::new(1) });
		}
		let features = DataFrame {
			columns: vec![Column::Number(score), Column::Enum(risk)],
		};
		(features, labels)
	}

	#[test]
	fn test_both_pipelines_learn_and_keep_feature_names() {
		let (features, labels) = training_data();
		let label_ids = crate::split::label_ids(&labels).unwrap();
		for config in &[PipelineConfig::bagging(), PipelineConfig::boosting()] {
			let pipeline = train(&features, &labels, config, &mut |_| {}).unwrap();
			let score = pipeline.score(&features, &label_ids).unwrap();
			assert!(score > 0.9, "training accuracy was {}", score);
			assert_eq!(
				pipeline.feature_names(),
				vec![
					"score".to_owned(),
					"risk = <missing>".to_owned(),
					"risk = Low".to_owned(),
					"risk = High".to_owned(),
				]
			);
			assert_eq!(pipeline.feature_importances().len(), 4);
			assert_eq!(pipeline.classes, vec!["Pass".to_owned(), "Fail".to_owned()]);
		}
	}

	#[test]
	fn test_bagging_fits_an_imputer_and_boosting_does_not() {
		let (features, labels) = training_data();
		let bagging = train(&features, &labels, &PipelineConfig::bagging(), &mut |_| {}).unwrap();
		assert!(bagging.imputer.is_some());
		let boosting =
			train(&features, &labels, &PipelineConfig::boosting(), &mut |_| {}).unwrap();
		assert!(boosting.imputer.is_none());
	}

	#[test]
	fn test_train_rejects_a_non_binary_target() {
		let (features, _) = training_data();
		let mut labels = EnumColumn::new(
			"outcome".to_owned(),
			vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
		);
		labels.data = vec![NonZeroUsize::new(1); features.nrows()];
		assert!(train(&features, &labels, &PipelineConfig::boosting(), &mut |_| {}).is_err());
	}

	#[test]
	fn test_predict_rejects_a_changed_schema() {
		let (features, labels) = training_data();
		let pipeline =
			train(&features, &labels, &PipelineConfig::boosting(), &mut |_| {}).unwrap();
		let mut other = features.clone();
		other.remove_column("risk");
		assert!(pipeline.predict(&other).is_err());
	}

	#[test]
	fn test_progress_is_reported_in_order() {
		let (features, labels) = training_data();
		let mut stages = Vec::new();
		train(&features, &labels, &PipelineConfig::bagging(), &mut |progress| {
			stages.push(match progress {
				TrainProgress::ComputingFeatures(_) => "features",
				TrainProgress::TrainingModel(_) => "model",
			});
		})
		.unwrap();
		assert_eq!(stages, vec!["features", "model"]);
	}
}
