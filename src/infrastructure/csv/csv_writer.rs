// ============================================================
// CSV WRITER
// ============================================================
// Serialize tables as CSV; missing cells become empty fields

use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;

use crate::domain::csv::Table;
use crate::domain::error::{AppError, Result};

/// CSV writer for [`Table`]s
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

    /// Write `table` to `path`, replacing any existing file
    pub fn write_file(&self, table: &Table, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {}", path.display(), e))
        })?;
        self.write(table, file)
    }

    /// Write `table` to any sink
    pub fn write<W: Write>(&self, table: &Table, sink: W) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);

        writer.write_record(table.column_names())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|cell| cell.unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}
