use crate::pipeline::TrainedPipeline;
use anyhow::{bail, format_err, Result};
use failcast_dataframe::{Column, DataFrame};
use ndarray::prelude::*;

/// These are the options passed to `compute_partial_dependence`.
#[derive(Debug, Clone)]
pub struct PartialDependenceOptions {
	/// The number of grid points per feature. Grid values are quantiles of the observed values, so the surface spends its resolution where the data actually is.
	pub grid_resolution: usize,
}

impl Default for PartialDependenceOptions {
	fn default() -> Self {
		Self { grid_resolution: 10 }
	}
}

/// A two way partial dependence surface: the model's mean predicted positive class probability over the data, as a pair of features is swept over a grid. `values[[i, j]]` is the mean probability at `x_values[i]` and `y_values[j]`.
#[derive(Debug)]
pub struct PartialDependenceSurface {
	pub feature_x: String,
	pub feature_y: String,
	pub x_values: Vec<f32>,
	pub y_values: Vec<f32>,
	pub values: Array2<f32>,
}

/**
Compute the two way partial dependence of a trained pipeline on a pair of number columns. Rows with a missing value in any column are dropped first, because a grid cell's mean would otherwise blend imputed and real values, and the grid is built from quantiles of what remains.

For each grid cell, both columns are overwritten with the cell's constant values across all retained rows, and the cell holds the mean predicted probability.
*/
pub fn compute_partial_dependence(
	pipeline: &TrainedPipeline,
	features: &DataFrame,
	feature_x: &str,
	feature_y: &str,
	options: &PartialDependenceOptions,
) -> Result<PartialDependenceSurface> {
	if options.grid_resolution < 2 {
		bail!("the grid resolution must be at least 2");
	}
	let x_index = column_index_of_number(features, feature_x)?;
	let y_index = column_index_of_number(features, feature_y)?;
	let complete_rows: Vec<usize> = (0..features.nrows())
		.filter(|row| {
			features.columns.iter().all(|column| match column {
				Column::Number(column) => !column.data[*row].is_nan(),
				Column::Enum(column) => column.data[*row].is_some(),
				Column::Text(_) => true,
				Column::Unknown(_) => false,
			})
		})
		.collect();
	if complete_rows.is_empty() {
		bail!("every row has at least one missing value, there is nothing to sweep over");
	}
	let mut working = features.select_rows(&complete_rows);
	let x_values = quantile_grid(
		&number_data(&working, x_index),
		options.grid_resolution,
	);
	let y_values = quantile_grid(
		&number_data(&working, y_index),
		options.grid_resolution,
	);
	let n_rows = working.nrows();
	let mut values = Array2::zeros((x_values.len(), y_values.len()));
	for (i, x) in x_values.iter().enumerate() {
		for (j, y) in y_values.iter().enumerate() {
			fill_number_column(&mut working, x_index, *x);
			fill_number_column(&mut working, y_index, *y);
			let probabilities = pipeline.predict_proba(&working)?;
			values[[i, j]] = probabilities.iter().sum::<f32>() / n_rows as f32;
		}
	}
	Ok(PartialDependenceSurface {
		feature_x: feature_x.to_owned(),
		feature_y: feature_y.to_owned(),
		x_values,
		y_values,
		values,
	})
}

fn column_index_of_number(features: &DataFrame, name: &str) -> Result<usize> {
	let index = features
		.column_index(name)
		.ok_or_else(|| format_err!("column \"{}\" is not in the table", name))?;
	match &features.columns[index] {
		Column::Number(_) => Ok(index),
		_ => bail!("column \"{}\" must be a number column", name),
	}
}

fn number_data(features: &DataFrame, column_index: usize) -> Vec<f32> {
	match &features.columns[column_index] {
		Column::Number(column) => column.data.clone(),
		_ => unreachable!(),
	}
}

fn fill_number_column(features: &mut DataFrame, column_index: usize, value: f32) {
	match &mut features.columns[column_index] {
		Column::Number(column) => {
			for entry in column.data.iter_mut() {
				*entry = value;
			}
		}
		_ => unreachable!(),
	}
}

/// Return `resolution` quantiles of the values, deduplicated, so ties in the data do not produce repeated grid points.
fn quantile_grid(values: &[f32], resolution: usize) -> Vec<f32> {
	let mut sorted = values.to_vec();
	sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
	let mut grid = Vec::with_capacity(resolution);
	for step in 0..resolution {
		let fraction = step as f32 / (resolution - 1) as f32;
		let index = (fraction * (sorted.len() - 1) as f32).round() as usize;
		let value = sorted[index];
		if grid.last() != Some(&value) {
			grid.push(value);
		}
	}
	grid
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::pipeline::{train, PipelineConfig};
	use failcast_dataframe::{EnumColumn, NumberColumn};
	use std::num::NonZeroUsize;

	fn training_data() -> (DataFrame, EnumColumn) {
		let n = 100;
		let mut latitude = NumberColumn::new("Latitude".to_owned());
		let mut longitude = NumberColumn::new("Longitude".to_owned());
		let mut labels = EnumColumn::new(
			"Fail".to_owned(),
			vec!["0".to_owned(), "1".to_owned()],
		);
		for i in 0..n {
			let x = 41.0 + (i % 10) as f32 / 10.0;
			let y = -88.0 + (i / 10) as f32 / 10.0;
			// A missing coordinate every so often.
			latitude.data.push(if i % 17 == 0 { f32::NAN } else { x });
			longitude.data.push(y);
			labels.data.push(if x > 41.5 {
				NonZeroUsize::new(2)
			} else {
				NonZeroUsize::new(1)
			});
		}
		let features = DataFrame {
			columns: vec![Column::Number(latitude), Column::Number(longitude)],
		};
		(features, labels)
	}

	#[test]
	fn test_partial_dependence_surface() {
		let (features, labels) = training_data();
		let pipeline =
			train(&features, &labels, &PipelineConfig::boosting(), &mut |_| {}).unwrap();
		let surface = compute_partial_dependence(
			&pipeline,
			&features,
			"Latitude",
			"Longitude",
			&PartialDependenceOptions::default(),
		)
		.unwrap();
		assert_eq!(surface.feature_x, "Latitude");
		assert!(surface.x_values.len() <= 10 && surface.x_values.len() >= 2);
		assert_eq!(
			surface.values.dim(),
			(surface.x_values.len(), surface.y_values.len())
		);
		// Grid values are drawn from the observed data, so they stay inside its range.
		for x in surface.x_values.iter() {
			assert!((41.0..=41.9).contains(x));
		}
		for value in surface.values.iter() {
			assert!((0.0..=1.0).contains(value));
		}
		// The label depends on latitude, so dependence should rise along the x axis.
		let first_row_mean = surface.values.row(0).mean().unwrap();
		let last_row_mean = surface
			.values
			.row(surface.x_values.len() - 1)
			.mean()
			.unwrap();
		assert!(last_row_mean > first_row_mean);
	}

	#[test]
	fn test_partial_dependence_rejects_a_categorical_column() {
		let (mut features, labels) = training_data();
		let mut kind = EnumColumn::new(
			"Kind".to_owned(),
			vec!["a".to_owned(), "b".to_owned()],
		);
		kind.data = (0..features.nrows())
			.map(|i| NonZeroUsize::new(i % 2 + 1))
			.collect();
		features.columns.push(Column::Enum(kind));
		let pipeline =
			train(&features, &labels, &PipelineConfig::boosting(), &mut |_| {}).unwrap();
		let result = compute_partial_dependence(
			&pipeline,
			&features,
			"Latitude",
			"Kind",
			&PartialDependenceOptions::default(),
		);
		assert!(result.is_err());
	}

	#[test]
	fn test_partial_dependence_requires_complete_rows() {
		let (mut features, labels) = training_data();
		let pipeline =
			train(&features, &labels, &PipelineConfig::boosting(), &mut |_| {}).unwrap();
		match &mut features.columns[1] {
			Column::Number(column) => {
				for value in column.data.iter_mut() {
					*value = f32::NAN;
				}
			}
			_ => unreachable!(),
		}
		let result = compute_partial_dependence(
			&pipeline,
			&features,
			"Latitude",
			"Longitude",
			&PartialDependenceOptions::default(),
		);
		assert!(result.is_err());
	}
}
