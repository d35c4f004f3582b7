use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const CONFIG_DIR_PREFIX: &str = "event-budget";

const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_RANGE: &str = "Sheet1!A1";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth token endpoint, also used as the assertion audience
    pub token_url: String,
    pub sheets_api_url: String,
    pub scope: String,
    /// The single cell holding the serialized dataset
    pub range: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            sheets_api_url: DEFAULT_SHEETS_API_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            range: DEFAULT_RANGE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    /// Re-issue a cached token this many seconds before it expires
    pub token_refresh_buffer_secs: i64,
    /// No timeout unless set
    pub request_timeout_secs: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            token_refresh_buffer_secs: 300,
            request_timeout_secs: None,
        }
    }
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        for (name, value) in [
            ("token_url", &config.google.token_url),
            ("sheets_api_url", &config.google.sheets_api_url),
        ] {
            Url::parse(value)
                .map_err(|e| AppError::Config(format!("Invalid google.{}: {}", name, e)))?;
        }

        if config.google.range.trim().is_empty() {
            return Err(AppError::Config("google.range must not be empty".to_string()));
        }

        Ok(config)
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_data_home()
            .ok_or_else(|| AppError::Config("Failed to determine data directory".to_string()))
    }

    /// Get a data file path
    pub fn data_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_data_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create data file path: {}", e)))
    }
}
