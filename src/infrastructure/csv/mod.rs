// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing, encoding fallback and writing tables back to disk

mod csv_parser;
mod csv_writer;

pub use csv_parser::{CsvParser, DEFAULT_NA_VALUES};
pub use csv_writer::CsvWriter;
