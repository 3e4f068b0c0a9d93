use super::*;
use anyhow::Result;
use fnv::FnvHashMap;
use itertools::izip;
use std::{
	collections::{BTreeMap, BTreeSet},
	num::NonZeroUsize,
	path::Path,
};

#[derive(Clone)]
pub struct FromCsvOptions {
	/// Column types to force, by column name. Columns not listed here have their types inferred.
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub infer_options: InferOptions,
}

impl Default for FromCsvOptions {
	fn default() -> Self {
		Self {
			column_types: None,
			infer_options: InferOptions::default(),
		}
	}
}

#[derive(Clone, Debug)]
pub struct InferOptions {
	/// A non-number column with at most this many unique values becomes an enum column, otherwise it becomes a text column.
	pub enum_max_unique_values: usize,
}

impl Default for InferOptions {
	fn default() -> Self {
		Self {
			enum_max_unique_values: 100,
		}
	}
}

/// These values are considered invalid, i.e. missing.
const INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions) -> Result<Self> {
		Self::from_csv(&mut csv::Reader::from_path(path)?, options)
	}

	pub fn from_csv<R>(reader: &mut csv::Reader<R>, options: FromCsvOptions) -> Result<Self>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let start_position = reader.position().clone();
		// Pass over the csv once to infer the type of each column whose type was not forced in the options.
		let mut infer_stats: Vec<Option<InferStats>> = column_names
			.iter()
			.map(|column_name| {
				let forced = options
					.column_types
					.as_ref()
					.map(|column_types| column_types.contains_key(column_name))
					.unwrap_or(false);
				if forced {
					None
				} else {
					Some(InferStats::new(&options.infer_options))
				}
			})
			.collect();
		let mut record = csv::StringRecord::new();
		let mut n_rows = 0;
		while reader.read_record(&mut record)? {
			n_rows += 1;
			for (index, infer_stats) in infer_stats.iter_mut().enumerate() {
				if let Some(infer_stats) = infer_stats {
					let value = record.get(index).unwrap();
					infer_stats.update(value);
				}
			}
		}
		let column_types: Vec<ColumnType> = column_names
			.iter()
			.zip(infer_stats.into_iter())
			.map(|(column_name, infer_stats)| match infer_stats {
				Some(infer_stats) => infer_stats.finalize(),
				None => options
					.column_types
					.as_ref()
					.unwrap()
					.get(column_name)
					.unwrap()
					.clone(),
			})
			.collect();
		// After inference, return to the beginning of the csv to load the values.
		reader.seek(start_position)?;
		let mut dataframe = Self::new(column_names, column_types);
		for column in dataframe.columns.iter_mut() {
			match column {
				Column::Unknown(_) => {}
				Column::Number(column) => column.data.reserve_exact(n_rows),
				Column::Enum(column) => column.data.reserve_exact(n_rows),
				Column::Text(column) => column.data.reserve_exact(n_rows),
			}
		}
		// Build an option lookup for each enum column so record values can be resolved to option indexes.
		let option_lookups: Vec<Option<FnvHashMap<String, NonZeroUsize>>> = dataframe
			.columns
			.iter()
			.map(|column| match column {
				Column::Enum(column) => Some(
					column
						.options
						.iter()
						.enumerate()
						.map(|(index, option)| {
							(option.clone(), NonZeroUsize::new(index + 1).unwrap())
						})
						.collect(),
				),
				_ => None,
			})
			.collect();
		// Read each csv record and insert the values into the columns of the dataframe.
		let mut record = csv::StringRecord::new();
		while reader.read_record(&mut record)? {
			for (column, lookup, value) in izip!(
				dataframe.columns.iter_mut(),
				option_lookups.iter(),
				record.iter()
			) {
				match column {
					Column::Unknown(column) => {
						column.len += 1;
					}
					Column::Number(column) => {
						let value = match lexical::parse::<f32, &str>(value) {
							Ok(value) if value.is_finite() => value,
							_ => f32::NAN,
						};
						column.data.push(value);
					}
					Column::Enum(column) => {
						let value = lookup.as_ref().unwrap().get(value).cloned();
						column.data.push(value);
					}
					Column::Text(column) => {
						column.data.push(value.to_owned());
					}
				}
			}
		}
		Ok(dataframe)
	}
}

#[derive(Clone, Debug)]
pub struct InferStats<'a> {
	infer_options: &'a InferOptions,
	column_type: InferColumnType,
	unique_values: Option<BTreeSet<String>>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Number,
	Enum,
	Text,
}

impl<'a> InferStats<'a> {
	pub fn new(infer_options: &'a InferOptions) -> Self {
		Self {
			infer_options,
			column_type: InferColumnType::Unknown,
			unique_values: Some(BTreeSet::new()),
		}
	}

	pub fn update(&mut self, value: &str) {
		if INVALID_VALUES.contains(&value) {
			return;
		}
		if let Some(unique_values) = self.unique_values.as_mut() {
			if !unique_values.contains(value) {
				unique_values.insert(value.to_owned());
			}
			if unique_values.len() > self.infer_options.enum_max_unique_values {
				self.unique_values = None;
			}
		}
		match self.column_type {
			InferColumnType::Unknown | InferColumnType::Number => {
				if lexical::parse::<f32, &str>(value)
					.map(|v| v.is_finite())
					.unwrap_or(false)
				{
					self.column_type = InferColumnType::Number;
				} else if self.unique_values.is_some() {
					self.column_type = InferColumnType::Enum;
				} else {
					self.column_type = InferColumnType::Text;
				}
			}
			InferColumnType::Enum => {
				if self.unique_values.is_none() {
					self.column_type = InferColumnType::Text;
				}
			}
			_ => {}
		}
	}

	pub fn finalize(self) -> ColumnType {
		match self.column_type {
			InferColumnType::Unknown => ColumnType::Unknown,
			InferColumnType::Number => {
				// If all the values in a number column are zero or one then make this an enum column instead, so binary coded targets load as enums.
				if let Some(unique_values) = self.unique_values {
					let mut values = unique_values.iter();
					if values.next().map(|s| s.as_str()) == Some("0")
						&& values.next().map(|s| s.as_str()) == Some("1")
						&& values.next().is_none()
					{
						return ColumnType::Enum {
							options: unique_values.into_iter().collect(),
						};
					}
				}
				ColumnType::Number
			}
			InferColumnType::Enum => ColumnType::Enum {
				options: self.unique_values.unwrap().into_iter().collect(),
			},
			InferColumnType::Text => ColumnType::Text,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_infer() {
		let csv = "number,enum,text,target\n1.5,red,hello,0\n2.5,green,world,1\n3.5,red,again,1\n";
		let dataframe = DataFrame::from_csv(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			FromCsvOptions {
				column_types: None,
				infer_options: InferOptions {
					enum_max_unique_values: 2,
				},
			},
		)
		.unwrap();
		assert_eq!(dataframe.nrows(), 3);
		assert!(matches!(dataframe.columns[0], Column::Number(_)));
		let color = dataframe.columns[1].as_enum().unwrap();
		assert_eq!(color.options, vec!["green".to_owned(), "red".to_owned()]);
		assert_eq!(color.option_name(color.data[0]), Some("red"));
		// Three unique values exceed the enum limit, so the column falls back to text.
		assert!(matches!(dataframe.columns[2], Column::Text(_)));
		// A number column whose values are all zero or one loads as an enum.
		let target = dataframe.columns[3].as_enum().unwrap();
		assert_eq!(target.options, vec!["0".to_owned(), "1".to_owned()]);
	}

	#[test]
	fn test_forced_column_types() {
		let csv = "id,value\n1,2.0\n2,3.0\n";
		let column_types = maplit::btreemap! {
			"id".to_owned() => ColumnType::Text,
		};
		let dataframe = DataFrame::from_csv(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			FromCsvOptions {
				column_types: Some(column_types),
				infer_options: InferOptions::default(),
			},
		)
		.unwrap();
		assert!(matches!(dataframe.columns[0], Column::Text(_)));
		assert!(matches!(dataframe.columns[1], Column::Number(_)));
	}

	#[test]
	fn test_missing_values() {
		let csv = "id,value\nx,1.0\ny,\nz,2.5\n";
		let dataframe = DataFrame::from_csv(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			FromCsvOptions::default(),
		)
		.unwrap();
		let column = dataframe.columns[1].as_number().unwrap();
		assert_eq!(column.data.len(), 3);
		assert!(column.data[1].is_nan());
	}
}
