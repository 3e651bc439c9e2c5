// ============================================================
// MERGE SERVICE USE CASE
// ============================================================
// Multi-file upload into the session's temp registry, and row-wise merge

use serde::Serialize;

use crate::domain::csv::{ColumnStatsMap, SelectionStats, Table};
use crate::domain::error::{AppError, Result};
use crate::domain::session::{SessionState, TempFileRegistry};
use crate::domain::upload::UploadedFile;
use crate::infrastructure::csv::{CsvParser, CsvWriter};
use crate::infrastructure::storage::{ensure_subdir, remove_quietly, secure_filename};

pub const MERGED_OUTPUT_FILENAME: &str = "merged_output.csv";

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub filename: String,
    pub columns: Vec<String>,
    pub column_stats: ColumnStatsMap,
    pub num_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub filename: String,
    pub stats: SelectionStats,
}

pub struct MergeService {
    parser: CsvParser,
    writer: CsvWriter,
}

impl MergeService {
    pub fn new(parser: CsvParser, writer: CsvWriter) -> Self {
        Self { parser, writer }
    }

    /// Parse every file, then store each as a temp CSV in a fresh registry.
    ///
    /// The first bad file aborts the whole batch. The session's registry is
    /// replaced only when the batch succeeds.
    pub fn upload_multiple(
        &self,
        session: &mut SessionState,
        files: &[UploadedFile],
    ) -> Result<Vec<FileSummary>> {
        if files.is_empty() {
            return Err(AppError::ValidationError("No files uploaded".to_string()));
        }
        if files.len() < 2 {
            return Err(AppError::ValidationError(
                "Select at least 2 files to merge".to_string(),
            ));
        }

        let mut parsed: Vec<(usize, &UploadedFile, Table)> = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            if file.filename.is_empty() {
                continue;
            }
            if !file.is_csv() {
                return Err(AppError::ValidationError(format!(
                    "File {} is not a valid CSV",
                    file.filename
                )));
            }
            let table = self
                .parser
                .parse_bytes(&file.bytes)
                .map_err(|e| describe_parse_failure(&file.filename, e))?;
            parsed.push((index, file, table));
        }

        let merge_dir = ensure_subdir(&session.merge_dir())?;
        let mut registry = TempFileRegistry::new();
        let mut summaries = Vec::with_capacity(parsed.len());
        for (index, file, table) in parsed {
            let key = secure_filename(&format!("temp_{}_{}", index, file.filename));
            let path = merge_dir.join(&key);
            if let Err(e) = self.writer.write_file(&table, &path) {
                remove_quietly(registry.paths());
                return Err(e);
            }
            registry.register(key, path);

            summaries.push(FileSummary {
                filename: file.filename.clone(),
                columns: table.column_names(),
                column_stats: ColumnStatsMap::of(&table),
                num_rows: table.row_count(),
            });
        }

        session.temp_files = registry;
        Ok(summaries)
    }

    /// Concatenate every registered temp file into `merged_output.csv`,
    /// then delete the temp files and clear the registry.
    pub fn merge(&self, session: &mut SessionState) -> Result<MergeSummary> {
        if session.temp_files.is_empty() {
            return Err(AppError::ValidationError("No files to merge".to_string()));
        }

        let tables = session
            .temp_files
            .paths()
            .map(|path| self.parser.parse_file(path))
            .collect::<Result<Vec<_>>>()?;
        let merged = Table::concat(&tables);

        let output_path = session.work_dir.join(MERGED_OUTPUT_FILENAME);
        self.writer.write_file(&merged, &output_path)?;

        remove_quietly(session.temp_files.paths());
        session.temp_files.clear();

        Ok(MergeSummary {
            filename: MERGED_OUTPUT_FILENAME.to_string(),
            stats: merged.selection_stats(),
        })
    }
}

fn describe_parse_failure(filename: &str, err: AppError) -> AppError {
    let message = match err {
        AppError::EmptyData(_) => format!("File {} is empty", filename),
        AppError::ParseError(_) => format!("File {} is not in valid CSV format", filename),
        other => format!("Failed to process file {}: {}", filename, other.message()),
    };
    AppError::ValidationError(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MergeService {
        MergeService::new(CsvParser::new(), CsvWriter::new())
    }

    fn csv_with_rows(name: &str, rows: usize) -> UploadedFile {
        let mut content = String::from("id,name,email\n");
        for i in 0..rows {
            content.push_str(&format!("{},user{},u{}@x.com\n", i, i, i));
        }
        UploadedFile::new(name, content.into_bytes())
    }

    #[test]
    fn test_upload_then_merge() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new(dir.path().to_path_buf());

        let files = vec![csv_with_rows("a.csv", 3), csv_with_rows("b.csv", 5)];
        let summaries = service().upload_multiple(&mut session, &files).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].filename, "a.csv");
        assert_eq!(summaries[1].num_rows, 5);
        assert_eq!(session.temp_files.len(), 2);
        assert!(session.temp_files.get("temp_0_a.csv").is_some());

        let temp_paths: Vec<_> = session.temp_files.paths().map(|p| p.to_path_buf()).collect();
        let summary = service().merge(&mut session).unwrap();
        assert_eq!(summary.filename, MERGED_OUTPUT_FILENAME);
        assert_eq!(summary.stats.num_rows, 8);
        assert_eq!(summary.stats.num_columns, 3);
        assert_eq!(summary.stats.total_cells, 24);
        assert!(session.temp_files.is_empty());
        assert!(temp_paths.iter().all(|p| !p.exists()));
        assert!(dir.path().join(MERGED_OUTPUT_FILENAME).exists());
    }

    #[test]
    fn test_merge_aligns_mismatched_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new(dir.path().to_path_buf());
        let files = vec![
            UploadedFile::new("a.csv", b"id,name\n1,x\n".to_vec()),
            UploadedFile::new("b.csv", b"id,city\n2,Lisbon\n".to_vec()),
        ];
        service().upload_multiple(&mut session, &files).unwrap();

        let summary = service().merge(&mut session).unwrap();
        assert_eq!(summary.stats.columns, vec!["id", "name", "city"]);
        let written = std::fs::read_to_string(dir.path().join(MERGED_OUTPUT_FILENAME)).unwrap();
        assert_eq!(written, "id,name,city\n1,x,\n2,,Lisbon\n");
    }

    #[test]
    fn test_fewer_than_two_files_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new(dir.path().to_path_buf());
        let err = service()
            .upload_multiple(&mut session, &[csv_with_rows("a.csv", 1)])
            .unwrap_err();
        assert_eq!(err.message(), "Select at least 2 files to merge");
    }

    #[test]
    fn test_bad_file_aborts_batch_and_keeps_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new(dir.path().to_path_buf());
        service()
            .upload_multiple(
                &mut session,
                &[csv_with_rows("a.csv", 1), csv_with_rows("b.csv", 1)],
            )
            .unwrap();
        let before = session.clone();

        let err = service()
            .upload_multiple(
                &mut session,
                &[csv_with_rows("c.csv", 1), UploadedFile::new("d.csv", Vec::new())],
            )
            .unwrap_err();
        assert_eq!(err.message(), "File d.csv is empty");
        assert_eq!(session, before);
        assert!(!dir.path().join("merge").join("temp_0_c.csv").exists());

        let err = service()
            .upload_multiple(
                &mut session,
                &[
                    UploadedFile::new("x.txt", b"a\n1".to_vec()),
                    csv_with_rows("c.csv", 1),
                ],
            )
            .unwrap_err();
        assert_eq!(err.message(), "File x.txt is not a valid CSV");

        let err = service()
            .upload_multiple(
                &mut session,
                &[
                    csv_with_rows("c.csv", 1),
                    UploadedFile::new("bad.csv", b"a,b\n1,2,3\n".to_vec()),
                ],
            )
            .unwrap_err();
        assert_eq!(err.message(), "File bad.csv is not in valid CSV format");
    }

    #[test]
    fn test_empty_filenames_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new(dir.path().to_path_buf());
        let files = vec![
            csv_with_rows("a.csv", 2),
            UploadedFile::new("", Vec::new()),
            csv_with_rows("c.csv", 2),
        ];
        let summaries = service().upload_multiple(&mut session, &files).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(session.temp_files.get("temp_2_c.csv").is_some());
    }

    #[test]
    fn test_merge_leaves_single_upload_alone() {
        use crate::application::TableService;

        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new(dir.path().to_path_buf());
        let tables = TableService::new(CsvParser::new(), CsvWriter::new());
        for name in ["temp_0_a.csv", "merged_output.csv"] {
            tables
                .upload(&mut session, &UploadedFile::new(name, b"x\n1\n".to_vec()))
                .unwrap();

            let files = vec![csv_with_rows("a.csv", 2), csv_with_rows("b.csv", 2)];
            service().upload_multiple(&mut session, &files).unwrap();
            service().merge(&mut session).unwrap();

            let summary = tables.process(&mut session, &["x".to_string()]).unwrap();
            assert_eq!(summary.stats.selection.num_rows, 1);
        }
    }

    #[test]
    fn test_merge_without_registry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = SessionState::new(dir.path().to_path_buf());
        let err = service().merge(&mut session).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
