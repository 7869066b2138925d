// src/dataset/mod.rs

pub mod csv_file;

pub use csv_file::{read_dataset, write_dataset, write_dataset_path, CsvSource};

/// An in-memory table of string cells.
///
/// The column set is fixed when the table is built. Cells are never null: a
/// missing value is the empty string. Rows keep their load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a table; short rows are padded with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of the column with exactly this header (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            headers: &self.headers,
            values,
        })
    }

    /// Cell at (`row`, `col`); out-of-range positions read as empty.
    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Overwrite one cell. Returns false if the position is out of range.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }

    pub(crate) fn raw_rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Borrowed view of one row: column name to value, in header order.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let (headers, values) = (self.headers, self.values);
        headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| values.get(i))
            .map(String::as_str)
    }
}

/// Anything that can deliver a table of rows.
pub trait DataSource {
    fn load(&mut self) -> anyhow::Result<Dataset>;
}
