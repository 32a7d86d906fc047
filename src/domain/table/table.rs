// ============================================================
// TABLE TYPES
// ============================================================
// Header plus rows, every row total over the header

use serde::{Deserialize, Serialize};

/// A single data row, one value per header position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    /// Value at a header position, empty when out of range
    pub fn value_at(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered header with ordered rows.
///
/// Rows are stored positionally against the header, so a row always carries
/// exactly one value per column. Values that were absent in the source are
/// the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from a header and raw rows, normalizing each row width
    pub fn from_rows<I>(headers: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut table = Self::new(headers);
        for values in rows {
            table.push_row(values);
        }
        table
    }

    /// Append a row; short rows are padded with "" and extra cells dropped
    pub fn push_row(&mut self, mut values: Vec<String>) {
        values.resize(self.headers.len(), String::new());
        self.rows.push(Row { values });
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First header position carrying `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell lookup by row index and column name, "" when either is missing
    pub fn value(&self, row: usize, column: &str) -> &str {
        match (self.rows.get(row), self.column_index(column)) {
            (Some(row), Some(idx)) => row.value_at(idx),
            _ => "",
        }
    }

    /// A row as (column, value) pairs in header order
    pub fn record(&self, row: usize) -> Option<Vec<(&str, &str)>> {
        let row = self.rows.get(row)?;
        Some(
            self.headers
                .iter()
                .enumerate()
                .map(|(idx, h)| (h.as_str(), row.value_at(idx)))
                .collect(),
        )
    }

    /// Header plus at most `limit` leading rows
    pub fn preview(&self, limit: usize) -> TablePreview {
        TablePreview {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .take(limit)
                .map(|r| r.values.clone())
                .collect(),
            total_rows: self.rows.len(),
        }
    }
}

/// Bounded view of a table for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}
