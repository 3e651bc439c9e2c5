use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::application::{MergeService, PresetService, TableService};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::preset_store::{JsonFilePresetStore, PresetStore};
use crate::infrastructure::session_store::SessionStore;
use crate::infrastructure::storage::{ensure_presets_dir, ensure_upload_root};
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Create the storage directories and wire every service for the HTTP layer.
pub fn setup(config: AppConfig) -> Result<HttpState> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let upload_root = ensure_upload_root(&config.upload_dir).map_err(|err| {
        error!(
            error = %err,
            upload_dir = %config.upload_dir.display(),
            "Failed to create upload dir"
        );
        err
    })?;

    let presets_dir = ensure_presets_dir(&config.presets_dir).map_err(|err| {
        error!(
            error = %err,
            presets_dir = %config.presets_dir.display(),
            "Failed to create presets dir"
        );
        err
    })?;

    let preset_store: Arc<dyn PresetStore> = Arc::new(JsonFilePresetStore::new(presets_dir));
    let sessions = SessionStore::new(upload_root);

    info!(
        upload_dir = %sessions.upload_root().display(),
        presets_dir = %config.presets_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        "Storage ready"
    );
    add_log(&logs, "INFO", "System", "CSV curator initialized");

    Ok(HttpState {
        table_service: TableService::new(config.parser(), config.writer()),
        merge_service: MergeService::new(config.parser(), config.writer()),
        preset_service: PresetService::new(preset_store),
        sessions,
        logs,
        config,
    })
}
