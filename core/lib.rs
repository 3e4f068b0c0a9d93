/*!
This crate ties the failcast workflow together: load a dated inspections csv, wrangle away leaky and degenerate columns, split chronologically into training and validation sets, establish the baseline accuracy, train the bagging and boosting pipelines, and evaluate them with accuracy, an ROC curve, a classification report, permutation feature importances and an optional partial dependence surface.

Each stage takes its inputs and returns new outputs instead of mutating shared state, so the data flows strictly forward: raw table, cleaned table, feature matrix and target, train and validation partitions, fitted pipelines, metrics.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod baseline;
pub mod evaluate;
pub mod load;
pub mod partial_dependence;
pub mod pipeline;
pub mod progress;
pub mod split;
pub mod wrangle;

#[cfg(test)]
mod test;

pub use self::baseline::baseline_accuracy;
pub use self::evaluate::{
	compute_permutation_importances, evaluate, EvaluateOutput, PermutationImportance,
	PermutationImportanceOptions,
};
pub use self::load::{load_dated_csv, DatedDataFrame, LoadOptions};
pub use self::partial_dependence::{
	compute_partial_dependence, PartialDependenceOptions, PartialDependenceSurface,
};
pub use self::pipeline::{
	train, ImputeStrategy, ModelConfig, PipelineConfig, TrainedModel, TrainedPipeline,
};
pub use self::progress::TrainProgress;
pub use self::split::{label_ids, split_by_date, split_features_and_target, DateSplit};
pub use self::wrangle::{wrangle, WrangleOptions};
