use super::{BranchNode, LeafNode, Node, SplitDirection, Tree};
use ndarray::prelude::*;
use rand_xoshiro::Xoshiro256Plus;

/// These are the options passed to `train_single_tree`. The ensembles build them from their own options.
#[derive(Debug, Clone)]
pub struct SingleTreeOptions {
	/// The depth of the tree will never exceed this value.
	pub max_depth: usize,
	/// A split is only valid if it sends at least this many training examples to each child.
	pub min_examples_per_child: usize,
	/// The L2 regularization added to the hessian sum when computing leaf values and split gains.
	pub l2_regularization: f32,
	/// The fraction of features considered as split candidates at each node.
	pub features_fraction: f32,
	/// A node is only split if the best split achieves at least this gain.
	pub min_gain_to_split: f32,
}

impl Default for SingleTreeOptions {
	fn default() -> Self {
		Self {
			max_depth: 6,
			min_examples_per_child: 1,
			l2_regularization: 0.0,
			features_fraction: 1.0,
			min_gain_to_split: 0.0,
		}
	}
}

/**
Train a single regression tree on per example gradients and hessians, using exact greedy split finding.

The leaf values minimize the second order loss approximation, `-sum(gradients) / (sum(hessians) + l2)`. With gradients equal to the negated targets and unit hessians this reduces to the mean target value per leaf, which is how the random forest grows probability trees. The gradient boosting ensemble passes logistic gradients and hessians instead.

Examples with a missing (NaN) value for the split feature are sent in whichever direction yields the higher gain, and the chosen direction is recorded on the branch.
*/
pub fn train_single_tree(
	features: ArrayView2<f32>,
	gradients: &[f32],
	hessians: &[f32],
	examples: Vec<usize>,
	options: &SingleTreeOptions,
	rng: &mut Xoshiro256Plus,
) -> Tree {
	let mut nodes = Vec::new();
	train_node(
		&mut nodes, features, gradients, hessians, examples, 0, options, rng,
	);
	Tree { nodes }
}

#[allow(clippy::too_many_arguments)]
fn train_node(
	nodes: &mut Vec<Node>,
	features: ArrayView2<f32>,
	gradients: &[f32],
	hessians: &[f32],
	examples: Vec<usize>,
	depth: usize,
	options: &SingleTreeOptions,
	rng: &mut Xoshiro256Plus,
) -> usize {
	let sum_gradients: f64 = examples.iter().map(|i| gradients[*i] as f64).sum();
	let sum_hessians: f64 = examples.iter().map(|i| hessians[*i] as f64).sum();
	let should_try_split =
		depth < options.max_depth && examples.len() >= 2 * options.min_examples_per_child;
	let split = if should_try_split {
		choose_best_split(
			features,
			gradients,
			hessians,
			&examples,
			sum_gradients,
			sum_hessians,
			options,
			rng,
		)
	} else {
		None
	};
	match split {
		Some(split) => {
			let (left_examples, right_examples): (Vec<usize>, Vec<usize>) =
				examples.into_iter().partition(|example| {
					let value = features[[*example, split.feature_index]];
					if value.is_nan() {
						split.invalid_values_direction == SplitDirection::Left
					} else {
						value <= split.split_value
					}
				});
			let node_index = nodes.len();
			nodes.push(Node::Branch(BranchNode {
				left_child_index: 0,
				right_child_index: 0,
				feature_index: split.feature_index,
				split_value: split.split_value,
				invalid_values_direction: split.invalid_values_direction,
			}));
			let left_child_index = train_node(
				nodes,
				features,
				gradients,
				hessians,
				left_examples,
				depth + 1,
				options,
				rng,
			);
			let right_child_index = train_node(
				nodes,
				features,
				gradients,
				hessians,
				right_examples,
				depth + 1,
				options,
				rng,
			);
			if let Node::Branch(branch) = &mut nodes[node_index] {
				branch.left_child_index = left_child_index;
				branch.right_child_index = right_child_index;
			}
			node_index
		}
		None => {
			let value =
				(-sum_gradients / (sum_hessians + options.l2_regularization as f64)) as f32;
			let node_index = nodes.len();
			nodes.push(Node::Leaf(LeafNode { value }));
			node_index
		}
	}
}

#[derive(Debug)]
struct ChosenSplit {
	feature_index: usize,
	split_value: f32,
	invalid_values_direction: SplitDirection,
	gain: f32,
}

#[allow(clippy::too_many_arguments)]
fn choose_best_split(
	features: ArrayView2<f32>,
	gradients: &[f32],
	hessians: &[f32],
	examples: &[usize],
	sum_gradients: f64,
	sum_hessians: f64,
	options: &SingleTreeOptions,
	rng: &mut Xoshiro256Plus,
) -> Option<ChosenSplit> {
	let n_features = features.ncols();
	let n_candidates = usize::max(
		1,
		(options.features_fraction * n_features as f32).round() as usize,
	);
	let candidate_features: Vec<usize> = if n_candidates >= n_features {
		(0..n_features).collect()
	} else {
		rand::seq::index::sample(rng, n_features, n_candidates).into_vec()
	};
	let parent_score = split_score(sum_gradients, sum_hessians, options.l2_regularization);
	let mut best: Option<ChosenSplit> = None;
	for feature_index in candidate_features {
		let mut sorted: Vec<(f32, f32, f32)> = Vec::with_capacity(examples.len());
		let mut missing_gradients = 0.0f64;
		let mut missing_hessians = 0.0f64;
		let mut n_missing = 0usize;
		for example in examples.iter() {
			let value = features[[*example, feature_index]];
			if value.is_nan() {
				missing_gradients += gradients[*example] as f64;
				missing_hessians += hessians[*example] as f64;
				n_missing += 1;
			} else {
				sorted.push((value, gradients[*example], hessians[*example]));
			}
		}
		if sorted.len() < 2 {
			continue;
		}
		sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
		let mut left_gradients = 0.0f64;
		let mut left_hessians = 0.0f64;
		let mut n_left = 0usize;
		for i in 0..sorted.len() - 1 {
			left_gradients += sorted[i].1 as f64;
			left_hessians += sorted[i].2 as f64;
			n_left += 1;
			// Only a boundary between two distinct values is a valid threshold.
			if sorted[i].0 == sorted[i + 1].0 {
				continue;
			}
			let split_value = (sorted[i].0 + sorted[i + 1].0) / 2.0;
			for &direction in &[SplitDirection::Left, SplitDirection::Right] {
				let (gl, hl, nl) = if direction == SplitDirection::Left {
					(
						left_gradients + missing_gradients,
						left_hessians + missing_hessians,
						n_left + n_missing,
					)
				} else {
					(left_gradients, left_hessians, n_left)
				};
				let gr = sum_gradients - gl;
				let hr = sum_hessians - hl;
				let nr = examples.len() - nl;
				if nl < options.min_examples_per_child || nr < options.min_examples_per_child {
					continue;
				}
				let gain = (split_score(gl, hl, options.l2_regularization)
					+ split_score(gr, hr, options.l2_regularization)
					- parent_score) as f32;
				let is_better = match &best {
					Some(best) => gain > best.gain,
					None => gain > options.min_gain_to_split,
				};
				if is_better {
					best = Some(ChosenSplit {
						feature_index,
						split_value,
						invalid_values_direction: direction,
						gain,
					});
				}
			}
		}
	}
	best
}

fn split_score(sum_gradients: f64, sum_hessians: f64, l2_regularization: f32) -> f64 {
	let denominator = sum_hessians + l2_regularization as f64;
	if denominator <= 0.0 {
		return 0.0;
	}
	sum_gradients * sum_gradients / denominator
}
