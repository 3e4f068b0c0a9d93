/// A `Table` renders rows of strings as a padded text table with a header row. It owns its cells so callers can format values however they like before handing them over.
pub struct Table {
	header: Vec<String>,
	rows: Vec<Vec<String>>,
}

impl Table {
	pub fn new(header: Vec<String>) -> Self {
		Self {
			header,
			rows: Vec::new(),
		}
	}

	pub fn add_row(&mut self, row: Vec<String>) {
		assert_eq!(row.len(), self.header.len());
		self.rows.push(row);
	}
}

impl std::fmt::Display for Table {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let mut column_widths: Vec<usize> = self.header.iter().map(|h| h.len()).collect();
		for row in self.rows.iter() {
			for (column_width, value) in column_widths.iter_mut().zip(row.iter()) {
				*column_width = usize::max(*column_width, value.len());
			}
		}
		write_row(f, &self.header, &column_widths)?;
		write!(f, "|")?;
		for column_width in column_widths.iter() {
			for _ in 0..column_width + 2 {
				write!(f, "-")?;
			}
			write!(f, "|")?;
		}
		writeln!(f)?;
		for row in self.rows.iter() {
			write_row(f, row, &column_widths)?;
		}
		Ok(())
	}
}

fn write_row(
	f: &mut std::fmt::Formatter,
	values: &[String],
	column_widths: &[usize],
) -> std::fmt::Result {
	write!(f, "|")?;
	for (value, column_width) in values.iter().zip(column_widths.iter()) {
		write!(f, " {}", value)?;
		for _ in 0..column_width - value.len() + 1 {
			write!(f, " ")?;
		}
		write!(f, "|")?;
	}
	writeln!(f)
}
