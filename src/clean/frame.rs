//! In-memory string table the cleaning steps operate on

use crate::clean::CleanError;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// Named columns over rows of equal width
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    /// Builds a frame from headerless rows
    ///
    /// Columns are named by position and short rows are padded with empty
    /// cells.
    pub fn from_raw(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self {
            headers: (0..width).map(|i| i.to_string()).collect(),
            rows,
        }
    }

    /// Builds a frame from a header row followed by data rows
    pub fn with_header(mut rows: Vec<Vec<String>>) -> Result<Self, CleanError> {
        if rows.is_empty() {
            return Err(CleanError::Empty);
        }
        let headers = rows.remove(0);
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Ok(Self { headers, rows })
    }

    /// Reads a CSV file whose first record names the columns
    pub fn read_csv(path: &Path) -> Result<Self, CleanError> {
        let file = File::open(path).map_err(|source| CleanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let csv_error = |source: csv::Error| CleanError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(String::from)
            .collect();
        if headers.is_empty() {
            return Err(CleanError::Empty);
        }

        let mut rows = vec![headers];
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(String::from).collect());
        }
        Self::with_header(rows)
    }

    /// Writes the header and rows, replacing the file
    pub fn write_csv(&self, path: &Path) -> Result<(), CleanError> {
        let csv_error = |source: csv::Error| CleanError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        writer.write_record(&self.headers).map_err(csv_error)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| CleanError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`Frame::column_index`] but missing columns are an error
    pub fn require_column(&self, name: &str) -> Result<usize, CleanError> {
        self.column_index(name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_string()))
    }

    /// Drops the last column
    pub fn drop_last_column(&mut self) {
        if self.headers.pop().is_some() {
            for row in &mut self.rows {
                row.pop();
            }
        }
    }

    /// Keeps rows matching `keep`; returns how many were dropped
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[String]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    /// Replaces the headers with the first row
    pub fn promote_first_row(&mut self) -> Result<(), CleanError> {
        if self.rows.is_empty() {
            return Err(CleanError::Empty);
        }
        self.headers = self.rows.remove(0);
        Ok(())
    }

    /// Renames `from` to `to`; returns false if `from` is absent
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(index) => {
                self.headers[index] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Rewrites every value in one column
    pub fn map_column<F>(&mut self, index: usize, mut f: F)
    where
        F: FnMut(&str) -> String,
    {
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(index) {
                *cell = f(cell);
            }
        }
    }

    /// Drops repeated rows, keeping the first occurrence
    pub fn dedup_rows(&mut self) -> usize {
        let mut seen = HashSet::new();
        self.retain_rows(|row| seen.insert(row.to_vec()))
    }

    /// Empty cells per column, in column order
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.headers
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let missing = self
                    .rows
                    .iter()
                    .filter(|row| row.get(index).map_or(true, |c| c.is_empty()))
                    .count();
                (name.clone(), missing)
            })
            .collect()
    }

    /// Values of one column
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }
}
