/*!
This crate defines the metrics failcast computes on the validation split: accuracy, the ROC curve and the area under it, the per class precision/recall/f1 classification report, and streaming mean/variance used to summarize repeated measurements.
*/

mod accuracy;
mod classification_report;
mod mean_variance;
mod roc;

pub use self::accuracy::accuracy;
pub use self::classification_report::{ClassificationReport, ClassMetrics, AverageMetrics};
pub use self::mean_variance::MeanVariance;
pub use self::roc::{auc_roc, compute_roc_curve, RocCurvePoint};

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input arrives in chunks.

After being initialized, a value implementing `StreamingMetric` can have `update()` called on it with values of the associated type `Input`. Multiple values can be combined by calling `merge()`, which is useful when computing a metric across threads. Call `finalize()` to produce the associated type `Output`.
*/
pub trait StreamingMetric {
	type Input;
	type Output;
	fn update(&mut self, input: Self::Input);
	fn merge(&mut self, other: Self);
	fn finalize(self) -> Self::Output;
}
