// ============================================================
// TABLE SERVICE USE CASE
// ============================================================
// Single-file upload, column selection and ad hoc selection stats

use serde::Serialize;
use std::path::Path;

use crate::domain::csv::{ColumnStatsMap, SelectionStats, Table};
use crate::domain::error::{AppError, Result};
use crate::domain::session::SessionState;
use crate::domain::upload::UploadedFile;
use crate::infrastructure::csv::{CsvParser, CsvWriter};
use crate::infrastructure::storage::{ensure_subdir, secure_filename};

#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub filename: String,
    pub columns: Vec<String>,
    pub column_stats: ColumnStatsMap,
    pub total_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessStats {
    #[serde(flatten)]
    pub selection: SelectionStats,
    pub output_filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub filename: String,
    pub stats: ProcessStats,
}

/// Operations on the session's current single file
pub struct TableService {
    parser: CsvParser,
    writer: CsvWriter,
}

impl TableService {
    pub fn new(parser: CsvParser, writer: CsvWriter) -> Self {
        Self { parser, writer }
    }

    /// Save an uploaded CSV into the session's work dir and make it the current file.
    pub fn upload(&self, session: &mut SessionState, file: &UploadedFile) -> Result<UploadSummary> {
        if file.filename.is_empty() {
            return Err(AppError::ValidationError("No file selected".to_string()));
        }
        if !file.is_csv() {
            return Err(AppError::ValidationError(
                "Only CSV files are allowed".to_string(),
            ));
        }

        let filename = secure_filename(&file.filename);
        if filename.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Invalid file name: {}",
                file.filename
            )));
        }

        // A failed parse must leave the current file untouched
        let table = self.parser.parse_bytes(&file.bytes)?;

        let path = ensure_subdir(&session.uploads_dir())?.join(&filename);
        std::fs::write(&path, &file.bytes)?;
        session.current_file = Some(path);

        Ok(UploadSummary {
            filename,
            columns: table.column_names(),
            column_stats: ColumnStatsMap::of(&table),
            total_rows: table.row_count(),
        })
    }

    /// Keep only `columns` of the current file and write the result as `processed_<name>`.
    pub fn process(&self, session: &mut SessionState, columns: &[String]) -> Result<ProcessSummary> {
        if columns.is_empty() {
            return Err(AppError::ValidationError("No columns selected".to_string()));
        }

        let current = existing_current_file(session, "File not found")?;
        let table = self.parser.parse_file(current)?;
        let selected = table.select(columns)?;

        let basename = current
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_filename = format!("processed_{}", basename);
        let output_path = session.work_dir.join(&output_filename);
        self.writer.write_file(&selected, &output_path)?;

        session.processed_file = Some(output_path);

        Ok(ProcessSummary {
            filename: output_filename.clone(),
            stats: ProcessStats {
                selection: selected.selection_stats(),
                output_filename,
            },
        })
    }

    /// Read-only variant of [`process`](Self::process): reports the shape of the
    /// selection without writing anything.
    pub fn stats(&self, session: &SessionState, columns: &[String]) -> Result<SelectionStats> {
        let current = existing_current_file(session, "No file loaded")?;
        if columns.is_empty() {
            return Err(AppError::ValidationError("No columns selected".to_string()));
        }

        let table = self.load(current)?;
        let missing = table.missing_columns(columns);
        if !missing.is_empty() {
            return Err(AppError::ValidationError(format!(
                "The following columns do not exist in the file: {}",
                missing.join(", ")
            )));
        }

        Ok(table.select(columns)?.selection_stats())
    }

    /// Load the session's current file
    pub fn current_table(&self, session: &SessionState) -> Result<Table> {
        let current = existing_current_file(session, "No file loaded")?;
        self.load(current)
    }

    fn load(&self, path: &Path) -> Result<Table> {
        self.parser.parse_file(path)
    }
}

fn existing_current_file<'a>(session: &'a SessionState, message: &str) -> Result<&'a Path> {
    match session.current_file.as_deref() {
        Some(path) if path.exists() => Ok(path),
        _ => Err(AppError::NotFound(message.to_string())),
    }
}
