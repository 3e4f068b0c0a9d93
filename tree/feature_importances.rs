use super::{Node, Tree};

/// This function computes feature importances using the "split" method, where a feature's importance is proportional to the number of branch nodes that split on it. The result is normalized to sum to one, unless the trees contain no branches at all, in which case it is all zeros.
pub fn compute_feature_importances(trees: &[Tree], n_features: usize) -> Vec<f32> {
	let mut feature_importances = vec![0.0; n_features];
	for tree in trees.iter() {
		for node in tree.nodes.iter() {
			if let Node::Branch(branch) = node {
				feature_importances[branch.feature_index] += 1.0;
			}
		}
	}
	let total: f32 = feature_importances.iter().sum();
	if total > 0.0 {
		for feature_importance in feature_importances.iter_mut() {
			*feature_importance /= total;
		}
	}
	feature_importances
}
