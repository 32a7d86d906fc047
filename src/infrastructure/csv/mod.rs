// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing, encoding detection, and serialization

mod csv_parser;
mod csv_writer;

pub use csv_parser::{CsvParser, ParsedCsv};
pub use csv_writer::CsvWriter;
