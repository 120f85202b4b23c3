//! Runtime configuration
//!
//! Everything is read from the process environment (after `.env` is
//! loaded). Credentials never come from source code.

use crate::ai::gemini::{GeminiConfig, DEFAULT_GEMINI_BASE_URL};
use crate::ai::model_selector::{ModelPreference, DEFAULT_MODEL_PREFERENCE};
use crate::store::{GoogleSheetsTransport, RecordStore, SheetsRecordStore, SqliteRecordStore, StoreError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SHEET_NAME: &str = "Inspections";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No API key found (VIGIA_MASTER_KEY, GOOGLE_API_KEY, or --api-key)")]
    MissingApiKey,

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{0} is required for the sheets backend")]
    MissingSheetSetting(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the provider credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    /// Operator-wide master key
    Master,
    Environment,
    /// Typed in by the user
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Sheets,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "local" => Ok(Backend::Sqlite),
            "sheets" | "cloud" => Ok(Backend::Sheets),
            other => Err(format!("unknown backend '{}' (expected sqlite or sheets)", other)),
        }
    }
}

/// Resolved settings
#[derive(Debug, Clone)]
pub struct VigiaConfig {
    pub master_key: Option<String>,
    pub env_key: Option<String>,
    pub backend: Backend,
    pub db_path: Option<PathBuf>,
    pub sheet_id: Option<String>,
    pub sheet_name: String,
    pub sheets_token: Option<String>,
    pub model_preference: String,
    pub gemini_base_url: String,
    pub request_timeout: Duration,
    pub logo_path: Option<PathBuf>,
}

impl VigiaConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match get("VIGIA_BACKEND") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                key: "VIGIA_BACKEND",
                reason,
            })?,
            None => Backend::Sqlite,
        };

        let request_timeout = match get("VIGIA_REQUEST_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::Invalid {
                        key: "VIGIA_REQUEST_TIMEOUT_SECS",
                        reason: e.to_string(),
                    }
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "VIGIA_REQUEST_TIMEOUT_SECS",
                        reason: "must be positive".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            master_key: get("VIGIA_MASTER_KEY"),
            env_key: get("GOOGLE_API_KEY"),
            backend,
            db_path: get("VIGIA_DB_PATH").map(PathBuf::from),
            sheet_id: get("VIGIA_SHEET_ID"),
            sheet_name: get("VIGIA_SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            sheets_token: get("VIGIA_SHEETS_TOKEN"),
            model_preference: get("VIGIA_MODEL_PREFERENCE")
                .unwrap_or_else(|| DEFAULT_MODEL_PREFERENCE.to_string()),
            gemini_base_url: get("VIGIA_GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            request_timeout,
            logo_path: get("VIGIA_LOGO_PATH").map(PathBuf::from),
        })
    }

    /// Master key, then environment key, then the manual entry
    pub fn resolve_api_key(&self, manual: Option<&str>) -> Result<(String, ApiKeySource), ConfigError> {
        if let Some(key) = &self.master_key {
            return Ok((key.clone(), ApiKeySource::Master));
        }
        if let Some(key) = &self.env_key {
            return Ok((key.clone(), ApiKeySource::Environment));
        }
        manual
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| (k.to_string(), ApiKeySource::Manual))
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn gemini_config(&self, api_key: String) -> GeminiConfig {
        GeminiConfig {
            api_key,
            base_url: self.gemini_base_url.clone(),
            timeout: self.request_timeout,
            ..GeminiConfig::default()
        }
    }

    pub fn model_preference(&self) -> ModelPreference {
        ModelPreference::parse(&self.model_preference)
    }

    /// Construct the configured record store. Nothing is contacted yet.
    pub fn build_store(&self) -> Result<Arc<dyn RecordStore>, ConfigError> {
        match self.backend {
            Backend::Sqlite => {
                let path = match &self.db_path {
                    Some(path) => path.clone(),
                    None => SqliteRecordStore::default_path()?,
                };
                tracing::debug!("Using SQLite archive at {}", path.display());
                Ok(Arc::new(SqliteRecordStore::new(path)))
            }
            Backend::Sheets => {
                let sheet_id = self
                    .sheet_id
                    .clone()
                    .ok_or(ConfigError::MissingSheetSetting("VIGIA_SHEET_ID"))?;
                let token = self
                    .sheets_token
                    .clone()
                    .ok_or(ConfigError::MissingSheetSetting("VIGIA_SHEETS_TOKEN"))?;

                tracing::debug!("Using spreadsheet archive {} / {}", sheet_id, self.sheet_name);
                let transport = GoogleSheetsTransport::new(sheet_id, self.sheet_name.clone(), token)
                    .with_timeout(self.request_timeout);
                Ok(Arc::new(SheetsRecordStore::new(transport)))
            }
        }
    }
}
