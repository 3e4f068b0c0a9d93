use anyhow::{bail, format_err, Context, Result};
use chrono::NaiveDate;
use failcast_dataframe::{Column, ColumnType, DataFrame, FromCsvOptions, InferOptions};
use std::collections::BTreeMap;
use std::path::Path;

/// These are the options passed to `load_dated_csv`.
#[derive(Debug, Clone)]
pub struct LoadOptions {
	/// The name of the column holding the date each observation occurred, which becomes the table's index.
	pub date_column: String,
	/// If set, loading fails unless the csv has exactly this many rows. The reference inspections dataset has 51,916.
	pub expected_rows: Option<usize>,
	/// A categorical column with at most this many unique values loads as an enum column, otherwise as a text column.
	pub max_enum_options: usize,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			date_column: "Inspection Date".to_owned(),
			expected_rows: None,
			max_enum_options: 500,
		}
	}
}

/// A `DatedDataFrame` is an observation table together with the date of each row, the ordering key used for the chronological train/validation split.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedDataFrame {
	pub index: Vec<NaiveDate>,
	pub records: DataFrame,
}

impl DatedDataFrame {
	pub fn nrows(&self) -> usize {
		self.index.len()
	}

	pub fn select_rows(&self, row_indexes: &[usize]) -> Self {
		Self {
			index: row_indexes.iter().map(|i| self.index[*i]).collect(),
			records: self.records.select_rows(row_indexes),
		}
	}
}

/// Load a csv file into a `DatedDataFrame`, parsing the configured date column into the index and keeping all other columns.
pub fn load_dated_csv(path: &Path, options: &LoadOptions) -> Result<DatedDataFrame> {
	let mut reader = csv::Reader::from_path(path)
		.with_context(|| format!("failed to open csv file {}", path.display()))?;
	from_csv_reader(&mut reader, options)
}

/// Load a `DatedDataFrame` from an open csv reader. This is the entry point used by tests, which read from in-memory buffers.
pub fn from_csv_reader<R>(reader: &mut csv::Reader<R>, options: &LoadOptions) -> Result<DatedDataFrame>
where
	R: std::io::Read + std::io::Seek,
{
	// Force the date column to text so it is neither inferred as an enum nor dropped for cardinality before we can parse it.
	let mut column_types = BTreeMap::new();
	column_types.insert(options.date_column.clone(), ColumnType::Text);
	let dataframe_options = FromCsvOptions {
		column_types: Some(column_types),
		infer_options: InferOptions {
			enum_max_unique_values: options.max_enum_options,
		},
	};
	let mut records = DataFrame::from_csv(reader, dataframe_options)?;
	if let Some(expected_rows) = options.expected_rows {
		if records.nrows() != expected_rows {
			bail!(
				"expected {} rows, found {}",
				expected_rows,
				records.nrows()
			);
		}
	}
	let date_column = records.remove_column(&options.date_column).ok_or_else(|| {
		format_err!(
			"did not find date column \"{}\" among columns \"{}\"",
			options.date_column,
			records.column_names().join(", ")
		)
	})?;
	let date_column = match date_column {
		Column::Text(column) => column,
		_ => unreachable!(),
	};
	let index = date_column
		.data
		.iter()
		.map(|value| {
			parse_date(value)
				.with_context(|| format!("failed to parse \"{}\" as a date", value))
		})
		.collect::<Result<Vec<NaiveDate>>>()?;
	Ok(DatedDataFrame { index, records })
}

fn parse_date(value: &str) -> Result<NaiveDate> {
	for format in &["%Y-%m-%d", "%m/%d/%Y"] {
		if let Ok(date) = NaiveDate::parse_from_str(value, format) {
			return Ok(date);
		}
	}
	for format in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
		if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(value, format) {
			return Ok(datetime.date());
		}
	}
	bail!("unrecognized date format")
}

#[cfg(test)]
mod test {
	use super::*;

	const CSV: &str = "Inspection Date,Facility,Fail\n2016-01-05,Restaurant,0\n2017-03-02,Grocery,1\n03/09/2018,Restaurant,1\n";

	#[test]
	fn test_load_parses_dates_into_the_index() {
		let table = from_csv_reader(
			&mut csv::Reader::from_reader(std::io::Cursor::new(CSV)),
			&LoadOptions::default(),
		)
		.unwrap();
		assert_eq!(table.nrows(), 3);
		assert_eq!(table.index[0], NaiveDate::from_ymd(2016, 1, 5));
		assert_eq!(table.index[2], NaiveDate::from_ymd(2018, 3, 9));
		// The date column itself is no longer among the records.
		assert!(table.records.column("Inspection Date").is_none());
		assert_eq!(table.records.ncols(), 2);
	}

	#[test]
	fn test_expected_rows_contract() {
		let options = LoadOptions {
			expected_rows: Some(4),
			..Default::default()
		};
		let result = from_csv_reader(
			&mut csv::Reader::from_reader(std::io::Cursor::new(CSV)),
			&options,
		);
		assert!(result.is_err());
		let options = LoadOptions {
			expected_rows: Some(3),
			..Default::default()
		};
		assert!(from_csv_reader(
			&mut csv::Reader::from_reader(std::io::Cursor::new(CSV)),
			&options,
		)
		.is_ok());
	}

	#[test]
	fn test_unparseable_date_is_an_error() {
		let csv = "Inspection Date,Fail\nnot a date,0\n";
		let result = from_csv_reader(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			&LoadOptions::default(),
		);
		assert!(result.is_err());
	}

	#[test]
	fn test_missing_date_column_is_an_error() {
		let csv = "When,Fail\n2016-01-05,0\n";
		let result = from_csv_reader(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			&LoadOptions::default(),
		);
		assert!(result.is_err());
	}
}
