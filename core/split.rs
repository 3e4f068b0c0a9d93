use crate::load::DatedDataFrame;
use anyhow::{bail, format_err, Result};
use chrono::NaiveDate;
use failcast_dataframe::{Column, EnumColumn};

/// The chronological train/validation partition of a table. Rows dated strictly before the cutoff are the training set, the rest are the validation set.
#[derive(Debug)]
pub struct DateSplit {
	pub features_train: DatedDataFrame,
	pub labels_train: EnumColumn,
	pub features_val: DatedDataFrame,
	pub labels_val: EnumColumn,
}

/// Remove the target column from the table and return the remaining features together with it. The target must be an enum column.
pub fn split_features_and_target(
	mut table: DatedDataFrame,
	target: &str,
) -> Result<(DatedDataFrame, EnumColumn)> {
	let target_column = table
		.records
		.remove_column(target)
		.ok_or_else(|| format_err!("target column \"{}\" is not in the table", target))?;
	let target_column = match target_column {
		Column::Enum(column) => column,
		_ => bail!(
			"target column \"{}\" must be categorical with an enumerable set of values",
			target
		),
	};
	Ok((table, target_column))
}

/// Split the features and labels by date. Rows whose date is strictly before `cutoff` go to the training set, all other rows go to the validation set, each side keeping its original order.
pub fn split_by_date(
	features: &DatedDataFrame,
	labels: &EnumColumn,
	cutoff: NaiveDate,
) -> DateSplit {
	let mut train_indexes = Vec::new();
	let mut val_indexes = Vec::new();
	for (index, date) in features.index.iter().enumerate() {
		if *date < cutoff {
			train_indexes.push(index);
		} else {
			val_indexes.push(index);
		}
	}
	DateSplit {
		features_train: features.select_rows(&train_indexes),
		labels_train: labels.select_rows(&train_indexes),
		features_val: features.select_rows(&val_indexes),
		labels_val: labels.select_rows(&val_indexes),
	}
}

/// Convert an enum label column to zero-based class ids. A missing label is an error, because every row in a supervised dataset needs an outcome.
pub fn label_ids(labels: &EnumColumn) -> Result<Vec<usize>> {
	labels
		.data
		.iter()
		.enumerate()
		.map(|(index, value)| match value {
			Some(value) => Ok(value.get() - 1),
			None => bail!(
				"label column \"{}\" has a missing value at row {}",
				labels.name,
				index
			),
		})
		.collect()
}
