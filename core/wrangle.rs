use crate::load::DatedDataFrame;
use anyhow::{bail, Result};
use failcast_dataframe::Column;

/// These options control which columns `wrangle` removes from a loaded table.
#[derive(Debug, Clone)]
pub struct WrangleOptions {
	/// Columns that would leak the outcome into the features. Wrangling fails if any of them is absent, because silently training without the check would defeat its purpose.
	pub leaky_columns: Vec<String>,
	/// Columns with more distinct values than this are dropped. High cardinality catches identifier columns, addresses, and free text.
	pub max_cardinality: usize,
	/// Columns exempt from the cardinality rule. Coordinates have one value per site but still carry geographic signal.
	pub exempt_columns: Vec<String>,
}

impl Default for WrangleOptions {
	fn default() -> Self {
		Self {
			leaky_columns: vec!["Serious Violations Found".to_owned()],
			max_cardinality: 500,
			exempt_columns: vec!["Latitude".to_owned(), "Longitude".to_owned()],
		}
	}
}

/// Clean a loaded table for training. This removes the configured leaky columns, then drops every column whose cardinality exceeds the limit and every categorical column with at most one distinct value.
pub fn wrangle(table: DatedDataFrame, options: &WrangleOptions) -> Result<DatedDataFrame> {
	let mut table = table;
	for leaky_column in options.leaky_columns.iter() {
		if table.records.remove_column(leaky_column).is_none() {
			bail!(
				"leaky column \"{}\" is not in the table, so it cannot be removed",
				leaky_column
			);
		}
	}
	table
		.records
		.columns
		.retain(|column| should_keep(column, options));
	Ok(table)
}

fn should_keep(column: &Column, options: &WrangleOptions) -> bool {
	if options
		.exempt_columns
		.iter()
		.any(|name| name == column.name())
	{
		return true;
	}
	let distinct_count = column.distinct_count();
	if distinct_count > options.max_cardinality {
		return false;
	}
	// A categorical column with a single distinct value carries no information.
	match column {
		Column::Number(_) => true,
		Column::Unknown(_) | Column::Enum(_) | Column::Text(_) => distinct_count > 1,
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::load::{from_csv_reader, LoadOptions};

	fn test_table() -> DatedDataFrame {
		let csv = "Inspection Date,Inspection ID,Facility Type,State,Latitude,Serious Violations Found,Fail\n\
			2016-01-05,100,Restaurant,IL,41.8,1,1\n\
			2016-02-05,101,Grocery,IL,41.9,0,0\n\
			2016-03-05,102,Restaurant,IL,41.7,0,0\n\
			2016-04-05,103,Bakery,IL,41.6,1,1\n";
		from_csv_reader(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			&LoadOptions::default(),
		)
		.unwrap()
	}

	#[test]
	fn test_wrangle_drops_leaky_degenerate_and_high_cardinality_columns() {
		let options = WrangleOptions {
			max_cardinality: 3,
			..Default::default()
		};
		let table = wrangle(test_table(), &options).unwrap();
		let names = table.records.column_names();
		// The leaky column is removed.
		assert!(!names.contains(&"Serious Violations Found"));
		// The id column has four distinct values, above the limit of three, and the number cardinality rule applies to it.
		assert!(!names.contains(&"Inspection ID"));
		// The state column has a single value.
		assert!(!names.contains(&"State"));
		// Latitude is exempt from the cardinality rule.
		assert!(names.contains(&"Latitude"));
		assert_eq!(names, vec!["Facility Type", "Latitude", "Fail"]);
		assert_eq!(table.nrows(), 4);
	}

	#[test]
	fn test_wrangle_requires_the_leaky_column_to_exist() {
		let options = WrangleOptions {
			leaky_columns: vec!["No Such Column".to_owned()],
			..Default::default()
		};
		assert!(wrangle(test_table(), &options).is_err());
	}
}
