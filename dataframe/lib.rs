/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. It implements only the features needed to support failcast: typed columns, CSV loading with type inference, row selection, and distinct value counts.

Number columns store `f32` values and represent missing values as NaN. Enum columns store indexes into a list of options, where `None` represents a missing or invalid value. Text columns hold arbitrary strings, which failcast treats as categorical columns whose cardinality was too high to enumerate.
*/

use fnv::FnvHashSet;
use std::num::NonZeroUsize;

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Unknown(UnknownColumn),
	Number(NumberColumn),
	Enum(EnumColumn),
	Text(TextColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownColumn {
	pub name: String,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
	Unknown,
	Number,
	Enum { options: Vec<String> },
	Text,
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Unknown => Column::Unknown(UnknownColumn::new(column_name)),
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
				ColumnType::Text => Column::Text(TextColumn::new(column_name)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|column| column.name()).collect()
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	pub fn column_index(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|column| column.name() == name)
	}

	/// Remove the column with the given name from this dataframe and return it, or `None` if there is no such column.
	pub fn remove_column(&mut self, name: &str) -> Option<Column> {
		self.column_index(name)
			.map(|column_index| self.columns.remove(column_index))
	}

	/// Produce a new dataframe containing the rows at `row_indexes`, in that order. Indexes may repeat.
	pub fn select_rows(&self, row_indexes: &[usize]) -> Self {
		let columns = self
			.columns
			.iter()
			.map(|column| column.select_rows(row_indexes))
			.collect();
		Self { columns }
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name.as_str(),
			Self::Number(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
			Self::Text(s) => s.name.as_str(),
		}
	}

	pub fn column_type(&self) -> ColumnType {
		match self {
			Self::Unknown(_) => ColumnType::Unknown,
			Self::Number(_) => ColumnType::Number,
			Self::Enum(s) => ColumnType::Enum {
				options: s.options.clone(),
			},
			Self::Text(_) => ColumnType::Text,
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Self::Enum(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	/// Count the distinct non-missing values in this column. Missing values, NaN for number columns and `None` for enum columns, do not count toward the total.
	pub fn distinct_count(&self) -> usize {
		match self {
			Self::Unknown(_) => 0,
			Self::Number(s) => {
				let mut values = FnvHashSet::default();
				for value in s.data.iter() {
					if value.is_finite() {
						values.insert(value.to_bits());
					}
				}
				values.len()
			}
			Self::Enum(s) => {
				let mut values = FnvHashSet::default();
				for value in s.data.iter().flatten() {
					values.insert(value.get());
				}
				values.len()
			}
			Self::Text(s) => {
				let mut values = FnvHashSet::default();
				for value in s.data.iter() {
					values.insert(value.as_str());
				}
				values.len()
			}
		}
	}

	pub fn select_rows(&self, row_indexes: &[usize]) -> Self {
		match self {
			Self::Unknown(s) => Self::Unknown(UnknownColumn {
				name: s.name.clone(),
				len: row_indexes.len(),
			}),
			Self::Number(s) => Self::Number(NumberColumn {
				name: s.name.clone(),
				data: row_indexes.iter().map(|i| s.data[*i]).collect(),
			}),
			Self::Enum(s) => Self::Enum(s.select_rows(row_indexes)),
			Self::Text(s) => Self::Text(TextColumn {
				name: s.name.clone(),
				data: row_indexes.iter().map(|i| s.data[*i].clone()).collect(),
			}),
		}
	}
}

impl UnknownColumn {
	pub fn new(name: String) -> Self {
		Self { name, len: 0 }
	}
}

impl NumberColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	pub fn select_rows(&self, row_indexes: &[usize]) -> Self {
		Self {
			name: self.name.clone(),
			options: self.options.clone(),
			data: row_indexes.iter().map(|i| self.data[*i]).collect(),
		}
	}

	/// Resolve an enum value to the text of its option.
	pub fn option_name(&self, value: Option<NonZeroUsize>) -> Option<&str> {
		value.and_then(|value| self.options.get(value.get() - 1).map(|s| s.as_str()))
	}
}

impl TextColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}
