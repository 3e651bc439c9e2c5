use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Temp files registered by a multi-upload, in upload order.
/// Keys are the sanitized temp file names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempFileRegistry {
    entries: Vec<(String, PathBuf)>,
}

impl TempFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` under `key`, replacing any earlier entry with the same key.
    pub fn register(&mut self, key: impl Into<String>, path: PathBuf) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((key, path)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p.as_path())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(_, p)| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Single uploads live here, under `work_dir`
pub const UPLOADS_SUBDIR: &str = "uploads";

/// Multi-upload temp files live here, under `work_dir`
pub const MERGE_SUBDIR: &str = "merge";

/// Per-browser-session state, passed explicitly to every use case.
///
/// Outputs (`processed_*`, the merged file) sit directly in `work_dir`,
/// which is the only directory downloads are served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Directory holding this session's uploads and outputs
    pub work_dir: PathBuf,

    /// Most recently uploaded single CSV
    pub current_file: Option<PathBuf>,

    /// Last column-filtered output
    pub processed_file: Option<PathBuf>,

    pub temp_files: TempFileRegistry,
}

impl SessionState {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            current_file: None,
            processed_file: None,
            temp_files: TempFileRegistry::new(),
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.work_dir.join(UPLOADS_SUBDIR)
    }

    pub fn merge_dir(&self) -> PathBuf {
        self.work_dir.join(MERGE_SUBDIR)
    }
}
