use super::{
	compute_feature_importances, sigmoid, train::train_single_tree, LeafNode, Node,
	SingleTreeOptions, Tree,
};
use failcast_util::ProgressCounter;
use itertools::izip;
use ndarray::prelude::*;
use num_traits::clamp;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// These are the options passed to `GradientBoostingClassifier::train`. The round count is deliberately capped low by default to bound compute.
#[derive(Debug, Clone)]
pub struct GradientBoostingOptions {
	/// The number of boosting rounds, one tree per round.
	pub n_rounds: usize,
	/// The learning rate scales the leaf values to control the effect each tree has on the output.
	pub learning_rate: f32,
	/// The depth of a single tree will never exceed this value.
	pub max_depth: usize,
	/// A split is only valid if it sends at least this many training examples to each child.
	pub min_examples_per_child: usize,
	/// The L2 regularization applied to leaf values and split gains.
	pub l2_regularization: f32,
	/// The seed for feature subsampling.
	pub seed: u64,
}

impl Default for GradientBoostingOptions {
	fn default() -> Self {
		Self {
			n_rounds: 25,
			learning_rate: 0.3,
			max_depth: 6,
			min_examples_per_child: 1,
			l2_regularization: 1.0,
			seed: 42,
		}
	}
}

/**
A `GradientBoostingClassifier` is a sequential ensemble of shallow trees for a binary target. Training starts from the log odds of the positive class and, in each round, fits a tree to the logistic loss gradients of the current ensemble, so each tree corrects the residual error of the ones before it.

There is no imputation anywhere in this model: branches route missing values in the direction that maximized gain during training.
*/
#[derive(Debug, Clone)]
pub struct GradientBoostingClassifier {
	/// The initial prediction of the model given no trained trees, the log odds of the positive class in the training labels.
	pub bias: f32,
	/// The trees of the ensemble, in training order.
	pub trees: Vec<Tree>,
	/// The importance of each feature, measured by the fraction of branch nodes that split on it.
	pub feature_importances: Vec<f32>,
}

impl GradientBoostingClassifier {
	/// Train a gradient boosting classifier on a feature matrix and binary labels coded as 0 and 1. The progress counter is incremented once per round.
	pub fn train(
		features: ArrayView2<f32>,
		labels: &[usize],
		options: &GradientBoostingOptions,
		progress: &ProgressCounter,
	) -> Self {
		let n_examples = features.nrows();
		assert_eq!(n_examples, labels.len());
		let n_positive: usize = labels.iter().sum();
		let n_negative = n_examples - n_positive;
		let bias = (usize::max(n_positive, 1) as f32 / usize::max(n_negative, 1) as f32).ln();
		let mut logits = vec![bias; n_examples];
		let mut gradients = vec![0.0f32; n_examples];
		let mut hessians = vec![0.0f32; n_examples];
		let single_tree_options = SingleTreeOptions {
			max_depth: options.max_depth,
			min_examples_per_child: options.min_examples_per_child,
			l2_regularization: options.l2_regularization,
			features_fraction: 1.0,
			min_gain_to_split: 0.0,
		};
		let mut trees = Vec::with_capacity(options.n_rounds);
		for round_index in 0..options.n_rounds {
			for (gradient, hessian, label, logit) in
				izip!(gradients.iter_mut(), hessians.iter_mut(), labels, logits.iter())
			{
				let probability = clamp(sigmoid(*logit), f32::EPSILON, 1.0 - f32::EPSILON);
				*gradient = probability - *label as f32;
				*hessian = probability * (1.0 - probability);
			}
			let mut rng =
				Xoshiro256Plus::seed_from_u64(options.seed.wrapping_add(round_index as u64));
			let mut tree = train_single_tree(
				features,
				&gradients,
				&hessians,
				(0..n_examples).collect(),
				&single_tree_options,
				&mut rng,
			);
			// Scale the leaf values by the learning rate so each tree nudges the ensemble instead of jumping to the full correction.
			for node in tree.nodes.iter_mut() {
				if let Node::Leaf(LeafNode { value }) = node {
					*value *= options.learning_rate;
				}
			}
			for (logit, example) in logits.iter_mut().zip(features.axis_iter(Axis(0))) {
				*logit += tree.predict(example);
			}
			trees.push(tree);
			progress.inc(1);
		}
		let feature_importances = compute_feature_importances(&trees, features.ncols());
		Self {
			bias,
			trees,
			feature_importances,
		}
	}

	/// Return the positive class probability for each example.
	pub fn predict_proba(&self, features: ArrayView2<f32>) -> Vec<f32> {
		features
			.axis_iter(Axis(0))
			.map(|example| {
				let logit = self.bias
					+ self
						.trees
						.iter()
						.map(|tree| tree.predict(example))
						.sum::<f32>();
				sigmoid(logit)
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

#[cfg(test)]
mod test {
	use super::*;

	fn noisy_dataset() -> (Array2<f32>, Vec<usize>) {
		let n = 120;
		let mut features = Array2::zeros((n, 3));
		let mut labels = Vec::with_capacity(n);
		for i in 0..n {
			let x = i as f32 / n as f32;
			features[[i, 0]] = x;
			features[[i, 1]] = (i % 5) as f32;
			// Some missing values in an uninformative feature.
			features[[i, 2]] = if i % 11 == 0 { f32::NAN } else { (i % 3) as f32 };
			labels.push(if x >= 0.4 { 1 } else { 0 });
		}
		(features, labels)
	}

	#[test]
	fn test_boosting_learns_without_imputation() {
		let (features, labels) = noisy_dataset();
		let model = GradientBoostingClassifier::train(
			features.view(),
			&labels,
			&GradientBoostingOptions::default(),
			&ProgressCounter::new(25),
		);
		let predictions = model.predict(features.view());
		let n_correct = predictions
			.iter()
			.zip(labels.iter())
			.filter(|(p, l)| p == l)
			.count();
		assert!(n_correct >= 115, "boosting got {} of 120 correct", n_correct);
	}

	#[test]
	fn test_bias_is_log_odds() {
		let (features, labels) = noisy_dataset();
		let n_positive: usize = labels.iter().sum();
		let n_negative = labels.len() - n_positive;
		let model = GradientBoostingClassifier::train(
			features.view(),
			&labels,
			&GradientBoostingOptions {
				n_rounds: 1,
				..Default::default()
			},
			&ProgressCounter::new(1),
		);
		let expected = (n_positive as f32 / n_negative as f32).ln();
		assert!(f32::abs(model.bias - expected) < 1e-6);
	}

	#[test]
	fn test_same_seed_reproduces_the_ensemble() {
		let (features, labels) = noisy_dataset();
		let options = GradientBoostingOptions::default();
		let a = GradientBoostingClassifier::train(
			features.view(),
			&labels,
			&options,
			&ProgressCounter::new(25),
		);
		let b = GradientBoostingClassifier::train(
			features.view(),
			&labels,
			&options,
			&ProgressCounter::new(25),
		);
		assert_eq!(
			a.predict_proba(features.view()),
			b.predict_proba(features.view())
		);
	}
}
