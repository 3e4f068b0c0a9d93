use super::{
	compute_feature_importances, train::train_single_tree, SingleTreeOptions, Tree,
};
use failcast_util::ProgressCounter;
use ndarray::prelude::*;
use num_traits::clamp;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

/// These are the options passed to `RandomForestClassifier::train`. The tree count is deliberately capped low by default to bound compute.
#[derive(Debug, Clone)]
pub struct RandomForestOptions {
	/// The number of trees in the forest.
	pub n_trees: usize,
	/// The depth of a single tree will never exceed this value.
	pub max_depth: usize,
	/// A split is only valid if it sends at least this many training examples to each child.
	pub min_examples_per_child: usize,
	/// The fraction of features considered as split candidates at each node.
	pub features_fraction: f32,
	/// The seed for bootstrap sampling and feature subsampling.
	pub seed: u64,
}

impl Default for RandomForestOptions {
	fn default() -> Self {
		Self {
			n_trees: 25,
			max_depth: 16,
			min_examples_per_child: 1,
			features_fraction: 0.5,
			seed: 42,
		}
	}
}

/**
A `RandomForestClassifier` is a bagged ensemble of probability trees for a binary target. Each tree is grown on a bootstrap sample of the training examples with feature subsampling at every node, and inference averages the per tree probabilities.

Trees are independent, so training is parallelized across them with rayon.
*/
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
	/// The trees in the forest.
	pub trees: Vec<Tree>,
	/// The importance of each feature, measured by the fraction of branch nodes that split on it.
	pub feature_importances: Vec<f32>,
}

impl RandomForestClassifier {
	/// Train a random forest on a feature matrix and binary labels coded as 0 and 1. The progress counter is incremented once per trained tree.
	pub fn train(
		features: ArrayView2<f32>,
		labels: &[usize],
		options: &RandomForestOptions,
		progress: &ProgressCounter,
	) -> Self {
		let n_examples = features.nrows();
		assert_eq!(n_examples, labels.len());
		// With gradients equal to the negated labels and unit hessians, each leaf holds the mean label of its examples, i.e. the positive class probability.
		let gradients: Vec<f32> = labels.iter().map(|label| -(*label as f32)).collect();
		let hessians: Vec<f32> = vec![1.0; n_examples];
		let single_tree_options = SingleTreeOptions {
			max_depth: options.max_depth,
			min_examples_per_child: options.min_examples_per_child,
			l2_regularization: 0.0,
			features_fraction: options.features_fraction,
			min_gain_to_split: 0.0,
		};
		let trees: Vec<Tree> = (0..options.n_trees)
			.into_par_iter()
			.map(|tree_index| {
				let mut rng =
					Xoshiro256Plus::seed_from_u64(options.seed.wrapping_add(tree_index as u64));
				let examples: Vec<usize> = (0..n_examples)
					.map(|_| rng.gen_range(0, n_examples))
					.collect();
				let tree = train_single_tree(
					features,
					&gradients,
					&hessians,
					examples,
					&single_tree_options,
					&mut rng,
				);
				progress.inc(1);
				tree
			})
			.collect();
		let feature_importances = compute_feature_importances(&trees, features.ncols());
		Self {
			trees,
			feature_importances,
		}
	}

	/// Return the positive class probability for each example, the mean of the per tree probabilities.
	pub fn predict_proba(&self, features: ArrayView2<f32>) -> Vec<f32> {
		features
			.axis_iter(Axis(0))
			.map(|example| {
				let sum: f32 = self.trees.iter().map(|tree| tree.predict(example)).sum();
				clamp(sum / self.trees.len() as f32, 0.0, 1.0)
			})
			.collect()
	}

	/// Return the predicted label for each example at the 0.5 probability threshold.
	pub fn predict(&self, features: ArrayView2<f32>) -> Vec<usize> {
		self.predict_proba(features)
			.into_iter()
			.map(|probability| if probability >= 0.5 { 1 } else { 0 })
			.collect()
	}
}
