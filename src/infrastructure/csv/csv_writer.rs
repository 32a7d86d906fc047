// ============================================================
// CSV WRITER
// ============================================================
// Render tables back to delimited text for download

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;

#[derive(Debug, Clone)]
pub struct CsvWriter {
    delimiter: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Header row then data rows, quoted only where needed, CRLF terminated.
    /// A table without columns renders as the empty string, rows included.
    pub fn write_table(&self, table: &Table) -> Result<String> {
        if table.headers().is_empty() {
            return Ok(String::new());
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());

        writer
            .write_record(table.headers())
            .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

        for (index, row) in table.rows().iter().enumerate() {
            writer.write_record(row.values()).map_err(|e| {
                AppError::Internal(format!("Failed to write CSV row {}: {}", index + 1, e))
            })?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush CSV output: {}", e)))?;

        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
    }
}
