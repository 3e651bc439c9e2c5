// ============================================================
// PRESET SERVICE USE CASE
// ============================================================
// Preset CRUD and resolving a preset against the current file

use std::sync::Arc;

use crate::domain::csv::Table;
use crate::domain::error::{AppError, Result};
use crate::domain::preset::{validate_name, ColumnSelector, Preset};
use crate::infrastructure::preset_store::PresetStore;

pub struct PresetService {
    store: Arc<dyn PresetStore>,
}

impl PresetService {
    pub fn new(store: Arc<dyn PresetStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Preset>> {
        self.store.list().await
    }

    /// Create or overwrite a preset
    pub async fn save(
        &self,
        name: &str,
        columns: Vec<Option<ColumnSelector>>,
        use_index: bool,
    ) -> Result<Preset> {
        let preset = Preset::new(name, columns, use_index)?;
        self.store.put(&preset).await?;
        Ok(preset)
    }

    /// Replace the columns of an existing preset
    pub async fn update(
        &self,
        name: &str,
        columns: Vec<Option<ColumnSelector>>,
        use_index: bool,
    ) -> Result<Preset> {
        let preset = Preset::new(name, columns, use_index)?;
        if !self.store.exists(name).await? {
            return Err(AppError::NotFound("Preset not found".to_string()));
        }
        self.store.put(&preset).await?;
        Ok(preset)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.store.delete(name).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Preset not found".to_string()))
        }
    }

    /// Look a preset up for application; the table is loaded only after this succeeds.
    pub async fn find(&self, name: &str) -> Result<Preset> {
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Preset name not provided".to_string(),
            ));
        }
        validate_name(name)?;
        self.store
            .get(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Preset {} not found", name)))
    }

    /// Resolve the preset into column names of `table`
    pub fn apply(&self, preset: &Preset, table: &Table) -> Result<Vec<String>> {
        preset.resolve(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::csv::CsvParser;
    use crate::infrastructure::preset_store::JsonFilePresetStore;

    fn service(dir: &tempfile::TempDir) -> PresetService {
        PresetService::new(Arc::new(JsonFilePresetStore::new(dir.path())))
    }

    fn names(values: &[&str]) -> Vec<Option<ColumnSelector>> {
        values
            .iter()
            .map(|v| Some(ColumnSelector::Name(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn test_save_then_list_strips_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);

        let mut columns = names(&["Email", "Name"]);
        columns.insert(1, None);
        service.save("contacts", columns, false).await.unwrap();

        let presets = service.list().await.unwrap();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].name, "contacts");
        assert_eq!(
            presets[0].columns,
            vec![
                ColumnSelector::Name("Email".into()),
                ColumnSelector::Name("Name".into())
            ]
        );
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);
        service.save("p", names(&["a"]), false).await.unwrap();
        service.save("p", names(&["b"]), false).await.unwrap();

        let presets = service.list().await.unwrap();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].columns, vec![ColumnSelector::Name("b".into())]);
    }

    #[tokio::test]
    async fn test_update_requires_existing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);

        let err = service.update("p", names(&["a"]), false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        service.save("p", names(&["a"]), false).await.unwrap();
        let updated = service
            .update("p", vec![Some(ColumnSelector::Index(0))], true)
            .await
            .unwrap();
        assert!(updated.use_index);

        let err = service.update("p", vec![], true).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);
        service.save("p", names(&["a"]), false).await.unwrap();

        service.delete("p").await.unwrap();
        let err = service.delete("p").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_and_apply() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir);
        service
            .save(
                "pos",
                vec![Some(ColumnSelector::Index(1)), Some(ColumnSelector::Index(0))],
                true,
            )
            .await
            .unwrap();

        let err = service.find("").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = service.find("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let table = CsvParser::new().parse_content("a,b,c\n1,2,3").unwrap();
        let preset = service.find("pos").await.unwrap();
        assert_eq!(service.apply(&preset, &table).unwrap(), vec!["b", "a"]);
    }
}
