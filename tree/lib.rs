/*!
This crate implements the two tree ensemble classifiers failcast compares: a bagged random forest and a gradient boosted ensemble of shallow trees. Both are built on the same single tree trainer, which grows regression trees on gradient and hessian sums the way LightGBM and XGBoost do, but in pure Rust.

Missing feature values are NaN. Every branch stores the direction examples with a missing value should be sent, chosen during training to maximize gain, so trained trees route missing values natively without imputation.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod feature_importances;
mod gradient_boosting;
mod random_forest;
mod train;

pub use self::feature_importances::compute_feature_importances;
pub use self::gradient_boosting::{GradientBoostingClassifier, GradientBoostingOptions};
pub use self::random_forest::{RandomForestClassifier, RandomForestOptions};
pub use self::train::{train_single_tree, SingleTreeOptions};

use ndarray::prelude::*;

/// Trees are stored as a `Vec` of `Node`s. Each branch in the tree has two indexes into the `Vec`, one for each of its children.
#[derive(Debug, Clone)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

/// A node is either a branch or a leaf.
#[derive(Debug, Clone)]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

/// A `BranchNode` compares the value of a single feature with a split value, and sends the example left if the value is less than or equal to it and right otherwise. Examples with a missing value for the feature are sent in the branch's invalid values direction.
#[derive(Debug, Clone)]
pub struct BranchNode {
	/// This is the index in the tree's node vector for this node's left child.
	pub left_child_index: usize,
	/// This is the index in the tree's node vector for this node's right child.
	pub right_child_index: usize,
	/// This is the index of the feature to get the value for.
	pub feature_index: usize,
	/// This is the threshold value of the split.
	pub split_value: f32,
	/// This is the direction examples with missing values should be sent.
	pub invalid_values_direction: SplitDirection,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitDirection {
	Left,
	Right,
}

/// The leaves in a tree hold the values to output for examples that get sent to them.
#[derive(Debug, Clone)]
pub struct LeafNode {
	pub value: f32,
}

impl Tree {
	/// Make a prediction for a single example.
	pub fn predict(&self, example: ArrayView1<f32>) -> f32 {
		// Start at the root node and traverse the tree until we get to a leaf.
		let mut node_index = 0;
		loop {
			match &self.nodes[node_index] {
				Node::Branch(branch) => {
					let value = example[branch.feature_index];
					let direction = if value.is_nan() {
						branch.invalid_values_direction
					} else if value <= branch.split_value {
						SplitDirection::Left
					} else {
						SplitDirection::Right
					};
					node_index = match direction {
						SplitDirection::Left => branch.left_child_index,
						SplitDirection::Right => branch.right_child_index,
					};
				}
				Node::Leaf(leaf) => return leaf.value,
			}
		}
	}
}

pub(crate) fn sigmoid(value: f32) -> f32 {
	1.0 / ((-value).exp() + 1.0)
}
