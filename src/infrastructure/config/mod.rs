use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::{CsvParser, CsvWriter, DEFAULT_NA_VALUES};

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "CSV_CURATOR_";

/// Variable naming an alternative TOML config file
pub const CONFIG_PATH_ENV: &str = "CSV_CURATOR_CONFIG";

pub const DEFAULT_CONFIG_FILE: &str = "csv_curator.toml";

/// Uploads larger than this are rejected before parsing (100 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root for uploaded, processed and merged files; each session gets a subdirectory.
    pub upload_dir: PathBuf,
    /// One `<name>.json` file per preset
    pub presets_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub delimiter: char,
    /// Trim surrounding whitespace from headers and values
    pub trim_whitespace: bool,
    /// Raw cell values counted as missing
    pub na_values: Vec<String>,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_dir: std::env::temp_dir().join("csv_curator"),
            presets_dir: PathBuf::from("presets"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            delimiter: ',',
            trim_whitespace: false,
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `CSV_CURATOR_*` variables.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::Internal(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(AppError::ValidationError(
                "max_upload_bytes must be > 0".to_string(),
            ));
        }
        if self.presets_dir.as_os_str().is_empty() {
            return Err(AppError::ValidationError(
                "presets_dir must not be empty".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(AppError::ValidationError(
                "delimiter must be a single ASCII character".to_string(),
            ));
        }
        Ok(())
    }

    pub fn parser(&self) -> CsvParser {
        CsvParser::new()
            .with_delimiter(self.delimiter as u8)
            .with_trim(self.trim_whitespace)
            .with_na_values(self.na_values.iter().cloned())
    }

    pub fn writer(&self) -> CsvWriter {
        CsvWriter::new().with_delimiter(self.delimiter as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Result<AppConfig> {
        AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.presets_dir, PathBuf::from("presets"));
        assert!(config.na_values.iter().any(|v| v.is_empty()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = with_toml("port = 8080\ndelimiter = \";\"\nna_values = [\"\"]").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.na_values, vec![String::new()]);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_zero_upload_limit_is_rejected() {
        let err = with_toml("max_upload_bytes = 0").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_parser_uses_configured_na_values() {
        let config = with_toml("na_values = [\"-\"]").unwrap();
        let table = config.parser().parse_content("a\n-\nNA").unwrap();
        assert_eq!(table.column("a").unwrap().non_missing(), 1);
    }
}
