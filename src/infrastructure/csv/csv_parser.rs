// ============================================================
// CSV PARSER
// ============================================================
// Parse uploaded CSV bytes into tables, with encoding detection

use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, WINDOWS_1252};
use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;
use crate::infrastructure::config::CsvConfig;

/// A parsed table and the delimiter it was read with
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub table: Table,
    pub delimiter: u8,
}

/// CSV parser with encoding detection
#[derive(Debug, Clone)]
pub struct CsvParser {
    /// Delimiter character, `None` to detect it from the content
    delimiter: Option<u8>,

    /// Whether to trim whitespace from values
    trim: bool,

    /// Encoding used when the bytes carry no BOM and are not UTF-8
    fallback: &'static Encoding,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: Some(b','),
            trim: false,
            fallback: WINDOWS_1252,
        }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CsvConfig) -> Result<Self> {
        Ok(Self {
            delimiter: config.delimiter_byte()?,
            trim: config.trim,
            fallback: config.fallback()?,
        })
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sniff the delimiter from each input
    pub fn with_auto_delimiter(mut self) -> Self {
        self.delimiter = None;
        self
    }

    /// Set whether to trim whitespace
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_fallback_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.fallback = encoding;
        self
    }

    /// Decode raw upload bytes, then parse them
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedCsv> {
        let content = self.decode(bytes)?;
        self.parse_delimited(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<Table> {
        self.parse_delimited(content).map(|parsed| parsed.table)
    }

    /// Parse CSV content, reporting the delimiter used.
    ///
    /// The first record is the header. Short rows are padded with empty
    /// values, cells past the header width are dropped and blank lines are
    /// skipped.
    pub fn parse_delimited(&self, content: &str) -> Result<ParsedCsv> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = Table::new(headers);

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            table.push_row(record.iter().map(str::to_string).collect());
        }

        debug!(
            columns = table.column_count(),
            rows = table.row_count(),
            delimiter = %(delimiter as char),
            "Parsed CSV content"
        );

        Ok(ParsedCsv { table, delimiter })
    }

    /// BOM first, then strict UTF-8, then the fallback encoding
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            if had_errors {
                return Err(AppError::ParseError(format!(
                    "Input is not valid {}",
                    encoding.name()
                )));
            }
            return Ok(text.into_owned());
        }

        if let Ok(text) = std::str::from_utf8(bytes) {
            return Ok(text.to_string());
        }

        warn!(
            encoding = self.fallback.name(),
            "Input is not UTF-8, decoding with fallback encoding"
        );
        let (text, _, had_errors) = self.fallback.decode(bytes);
        if had_errors {
            return Err(AppError::ParseError(format!(
                "Input is neither UTF-8 nor valid {}",
                self.fallback.name()
            )));
        }
        Ok(text.into_owned())
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(10)
            .collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}
