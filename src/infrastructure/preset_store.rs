use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::error::{AppError, Result};
use crate::domain::preset::{ColumnSelector, Preset};

#[async_trait]
pub trait PresetStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Preset>>;
    async fn get(&self, name: &str) -> Result<Option<Preset>>;
    async fn exists(&self, name: &str) -> Result<bool>;
    /// Create or overwrite
    async fn put(&self, preset: &Preset) -> Result<()>;
    /// Returns `false` when there was nothing to delete
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// On-disk shape. The name lives in the file name, not in the body.
#[derive(Debug, Serialize, Deserialize)]
struct PresetFile {
    columns: Vec<ColumnSelector>,
    #[serde(default)]
    use_index: bool,
}

/// One `<name>.json` file per preset
pub struct JsonFilePresetStore {
    dir: PathBuf,
}

impl JsonFilePresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    async fn read(&self, name: &str, path: &Path) -> Result<Preset> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            AppError::IoError(format!("Failed to read preset {}: {}", name, e))
        })?;
        let file: PresetFile = serde_json::from_str(&content).map_err(|e| {
            AppError::ParseError(format!("Failed to parse preset {}: {}", name, e))
        })?;
        Ok(Preset {
            name: name.to_string(),
            columns: file.columns,
            use_index: file.use_index,
        })
    }
}

#[async_trait]
impl PresetStore for JsonFilePresetStore {
    async fn list(&self) -> Result<Vec<Preset>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut presets = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            presets.push(self.read(name, &path).await?);
        }

        presets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(presets)
    }

    async fn get(&self, name: &str) -> Result<Option<Preset>> {
        let path = self.path_for(name);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        self.read(name, &path).await.map(Some)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(name)).await?)
    }

    async fn put(&self, preset: &Preset) -> Result<()> {
        let body = serde_json::to_string(&PresetFile {
            columns: preset.columns.clone(),
            use_index: preset.use_index,
        })?;
        fs::write(self.path_for(&preset.name), body).await.map_err(|e| {
            AppError::IoError(format!("Failed to save preset {}: {}", preset.name, e))
        })
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::IoError(format!(
                "Failed to remove preset {}: {}",
                name, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(name: &str, columns: Vec<ColumnSelector>, use_index: bool) -> Preset {
        Preset {
            name: name.to_string(),
            columns,
            use_index,
        }
    }

    #[tokio::test]
    async fn test_put_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePresetStore::new(dir.path());

        store
            .put(&preset(
                "contacts",
                vec![
                    ColumnSelector::Name("Email".into()),
                    ColumnSelector::Name("Name".into()),
                ],
                false,
            ))
            .await
            .unwrap();
        store
            .put(&preset("by_pos", vec![ColumnSelector::Index(1)], true))
            .await
            .unwrap();

        let presets = store.list().await.unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].name, "by_pos");
        assert!(presets[0].use_index);
        assert_eq!(
            presets[1].columns,
            vec![
                ColumnSelector::Name("Email".into()),
                ColumnSelector::Name("Name".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_file_shape_has_no_name_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePresetStore::new(dir.path());
        store
            .put(&preset("p", vec![ColumnSelector::Index(0)], true))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("p.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({"columns": [0], "use_index": true}));
    }

    #[tokio::test]
    async fn test_missing_use_index_defaults_to_false() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.json"), r#"{"columns": ["a"]}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = JsonFilePresetStore::new(dir.path());
        let presets = store.list().await.unwrap();
        assert_eq!(presets.len(), 1);
        assert!(!presets[0].use_index);
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePresetStore::new(dir.path());
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(!store.delete("nope").await.unwrap());

        store
            .put(&preset("p", vec![ColumnSelector::Name("a".into())], false))
            .await
            .unwrap();
        assert!(store.exists("p").await.unwrap());
        assert!(store.delete("p").await.unwrap());
        assert!(!store.exists("p").await.unwrap());
    }
}
