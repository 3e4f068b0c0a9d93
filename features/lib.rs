/*!
This crate transforms dataframe columns into the `f32` feature matrix the tree ensembles train on. Number columns pass through unchanged as identity features, and enum columns are one hot encoded with one indicator feature per option. Feature names preserve the source column and option names so importance reports stay interpretable.

It also provides the mean imputer used by the bagging pipeline to replace missing number values with the column mean learned on the training split. The boosting pipeline skips imputation because the trees route missing values natively.
*/

use anyhow::{format_err, Result};
use itertools::izip;
use ndarray::prelude::*;
use ndarray::s;
use failcast_dataframe::{Column, DataFrame};

/// This enum describes how to transform one column from the input dataframe into one or more columns of the output feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGroup {
	Identity(IdentityFeatureGroup),
	OneHotEncoded(OneHotEncodedFeatureGroup),
}

/// An `IdentityFeatureGroup` passes a single number column through to the output features untouched. Missing values stay NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityFeatureGroup {
	pub source_column_name: String,
}

/**
A `OneHotEncodedFeatureGroup` creates one number feature for each option in an enum column, plus one feature for missing or invalid values. For each example all of the features are 0.0 except the feature corresponding to the column's value, which is 1.0.

The feature for option `"Restaurant"` of column `"Facility Type"` is named `"Facility Type = Restaurant"`, and the missing value feature is named `"Facility Type = <missing>"`.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncodedFeatureGroup {
	pub source_column_name: String,
	pub options: Vec<String>,
}

impl FeatureGroup {
	/// Return the number of features this feature group will produce.
	pub fn n_features(&self) -> usize {
		match self {
			FeatureGroup::Identity(_) => 1,
			FeatureGroup::OneHotEncoded(s) => s.options.len() + 1,
		}
	}

	/// Return the names of the features this feature group will produce, preserving the source column and option names.
	pub fn feature_names(&self) -> Vec<String> {
		match self {
			FeatureGroup::Identity(s) => vec![s.source_column_name.clone()],
			FeatureGroup::OneHotEncoded(s) => {
				std::iter::once(format!("{} = <missing>", s.source_column_name))
					.chain(
						s.options
							.iter()
							.map(|option| format!("{} = {}", s.source_column_name, option)),
					)
					.collect()
			}
		}
	}

	pub fn source_column_name(&self) -> &str {
		match self {
			FeatureGroup::Identity(s) => &s.source_column_name,
			FeatureGroup::OneHotEncoded(s) => &s.source_column_name,
		}
	}
}

/// Choose a feature group for each column of the training dataframe: identity for number columns and one hot encoding for enum columns. Text and unknown columns cannot be featurized and produce an error, the cleaner is expected to have dropped them.
pub fn compute_feature_groups(dataframe: &DataFrame) -> Result<Vec<FeatureGroup>> {
	dataframe
		.columns
		.iter()
		.map(|column| match column {
			Column::Number(column) => Ok(FeatureGroup::Identity(IdentityFeatureGroup {
				source_column_name: column.name.clone(),
			})),
			Column::Enum(column) => Ok(FeatureGroup::OneHotEncoded(OneHotEncodedFeatureGroup {
				source_column_name: column.name.clone(),
				options: column.options.clone(),
			})),
			Column::Text(column) => Err(format_err!(
				"column \"{}\" is a text column and cannot be featurized",
				column.name
			)),
			Column::Unknown(column) => Err(format_err!(
				"column \"{}\" has unknown type and cannot be featurized",
				column.name
			)),
		})
		.collect()
}

/// Compute the feature matrix for a dataframe using feature groups computed on the training split. Fails if a source column is missing or has a different type than it had in training.
pub fn compute_features(
	dataframe: &DataFrame,
	feature_groups: &[FeatureGroup],
	progress: &impl Fn(),
) -> Result<Array2<f32>> {
	let n_features = feature_groups.iter().map(|g| g.n_features()).sum::<usize>();
	let mut features = Array2::zeros((dataframe.nrows(), n_features));
	let mut feature_index = 0;
	for feature_group in feature_groups.iter() {
		let n_features_in_group = feature_group.n_features();
		let column = dataframe
			.column(feature_group.source_column_name())
			.ok_or_else(|| {
				format_err!(
					"column \"{}\" is missing from the input",
					feature_group.source_column_name()
				)
			})?;
		let group_features =
			features.slice_mut(s![.., feature_index..feature_index + n_features_in_group]);
		match feature_group {
			FeatureGroup::Identity(feature_group) => {
				compute_identity_features(feature_group, column, group_features, progress)?
			}
			FeatureGroup::OneHotEncoded(feature_group) => {
				compute_one_hot_encoded_features(feature_group, column, group_features, progress)?
			}
		}
		feature_index += n_features_in_group;
	}
	Ok(features)
}

fn compute_identity_features(
	feature_group: &IdentityFeatureGroup,
	column: &Column,
	mut features: ArrayViewMut2<f32>,
	progress: &impl Fn(),
) -> Result<()> {
	let column = column.as_number().ok_or_else(|| {
		format_err!(
			"column \"{}\" is not a number column as it was in training",
			feature_group.source_column_name
		)
	})?;
	for (feature, value) in izip!(features.column_mut(0).iter_mut(), column.data.iter()) {
		*feature = *value;
		progress();
	}
	Ok(())
}

fn compute_one_hot_encoded_features(
	feature_group: &OneHotEncodedFeatureGroup,
	column: &Column,
	mut features: ArrayViewMut2<f32>,
	progress: &impl Fn(),
) -> Result<()> {
	let column = column.as_enum().ok_or_else(|| {
		format_err!(
			"column \"{}\" is not an enum column as it was in training",
			feature_group.source_column_name
		)
	})?;
	if column.options != feature_group.options {
		return Err(format_err!(
			"column \"{}\" has different options than it had in training",
			feature_group.source_column_name
		));
	}
	features.fill(0.0);
	// For each example, set the feature corresponding to the enum value to one. Index zero is the missing value feature.
	for (mut features, value) in izip!(features.axis_iter_mut(Axis(0)), column.data.iter()) {
		let feature_index = value.map(|v| v.get()).unwrap_or(0);
		features[feature_index] = 1.0;
		progress();
	}
	Ok(())
}

/// A `MeanImputer` replaces NaN feature values with the per feature means learned from the training feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanImputer {
	pub means: Vec<f32>,
}

impl MeanImputer {
	/// Learn the per feature means, ignoring NaN values. A feature with no finite values gets a mean of zero.
	pub fn fit(features: ArrayView2<f32>) -> Self {
		let means = features
			.gencolumns()
			.into_iter()
			.map(|column| {
				let mut sum = 0.0;
				let mut count = 0usize;
				for value in column.iter() {
					if value.is_finite() {
						sum += *value;
						count += 1;
					}
				}
				if count == 0 {
					0.0
				} else {
					sum / count as f32
				}
			})
			.collect();
		Self { means }
	}

	pub fn transform(&self, features: &mut Array2<f32>) {
		for (mut column, mean) in izip!(features.gencolumns_mut(), self.means.iter()) {
			for value in column.iter_mut() {
				if value.is_nan() {
					*value = *mean;
				}
			}
		}
	}
}
