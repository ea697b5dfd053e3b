//! Raw tabular data as read from a source CSV file.
//!
//! Values are kept as text; interpretation belongs to the normaliser and the
//! difficulty scorer, which know what each column means.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};
use trendscope_common::Result;

/// A header row plus data rows, all cells as strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table directly; rows shorter than the header are padded with
    /// empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self { headers: Vec::new(), rows: Vec::new() };
        let keep = table.set_headers(headers);
        for row in rows {
            table.push_row(row, &keep);
        }
        table
    }

    /// Parse CSV text with a header row.
    pub fn from_csv(csv_data: &str) -> Result<Self> {
        Self::from_reader(csv_data.as_bytes())
    }

    /// Read and parse a CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "Read raw table"
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut table = Self { headers: Vec::new(), rows: Vec::new() };
        let keep = table.set_headers(headers);

        for result in reader.records() {
            let record = result?;
            table.push_row(record.iter().map(str::to_string).collect(), &keep);
        }

        Ok(table)
    }

    /// Install the header row, dropping repeated names (first one wins).
    /// Returns the source positions that were kept.
    fn set_headers(&mut self, headers: Vec<String>) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut keep = Vec::with_capacity(headers.len());

        for (i, header) in headers.into_iter().enumerate() {
            // Spreadsheet exports often prefix the first header with a BOM.
            let header = if i == 0 {
                header.trim_start_matches('\u{feff}').to_string()
            } else {
                header
            };
            if seen.insert(header.clone()) {
                self.headers.push(header);
                keep.push(i);
            } else {
                warn!(column = %header, position = i, "Dropping duplicate column");
            }
        }
        keep
    }

    fn push_row(&mut self, cells: Vec<String>, keep: &[usize]) {
        let row = keep
            .iter()
            .map(|&i| cells.get(i).cloned().unwrap_or_default())
            .collect();
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of an exactly named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (row, column); empty when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Rename columns in place. Renames onto a name that already exists are
    /// skipped so that the first occurrence of a name is never shadowed.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for (from, to) in renames {
            if self.has_column(to) {
                if self.has_column(from) {
                    warn!(from = %from, to = %to, "Rename target already present; keeping existing column");
                }
                continue;
            }
            if let Some(i) = self.column_index(from) {
                self.headers[i] = (*to).to_string();
            }
        }
    }
}
