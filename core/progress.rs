use failcast_util::ProgressCounter;

/// This enum reports pipeline training progress to the caller through the update callback.
#[derive(Debug)]
pub enum TrainProgress {
	ComputingFeatures(ProgressCounter),
	TrainingModel(ProgressCounter),
}
