//! Studio configuration: `config.yaml` in the data directory, API keys from
//! `.env` or the environment.

use crate::backend::DEFAULT_BASE_URL;
use crate::database::{ScriptLength, DEFAULT_QUOTA_BYTES};
use crate::error::AppError;
use crate::metrics::DEFAULT_WORDS_PER_MINUTE;
use crate::studio::state::{DEFAULT_IMAGE_SIZE, DEFAULT_MODEL, DEFAULT_NUM_IMAGES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.yaml";
const DATABASE_FILE: &str = "studio.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub base_url: String,
    pub database_path: Option<PathBuf>,
    pub words_per_minute: u32,
    /// Unset means requests wait indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub storage_quota_bytes: usize,
    pub model: String,
    pub script_length: ScriptLength,
    pub image_size: String,
    pub num_images: u32,
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    #[serde(skip)]
    pub elevenlabs_api_key: Option<String>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database_path: None,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            request_timeout_secs: None,
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            model: DEFAULT_MODEL.to_string(),
            script_length: ScriptLength::default(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            num_images: DEFAULT_NUM_IMAGES,
            openai_api_key: None,
            elevenlabs_api_key: None,
        }
    }
}

/// Where config, `.env` and the database live unless told otherwise.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("aragornic-studio"))
        .unwrap_or_else(|| PathBuf::from(".aragornic-studio"))
}

impl StudioConfig {
    /// Load `config.yaml` from `data_dir` (defaults if absent), then pick up
    /// API keys and a base URL override from `.env` or the environment.
    pub fn load(data_dir: &Path) -> Result<Self, AppError> {
        let config_path = data_dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            Self::read_file(&config_path)?
        } else {
            log::info!("No config at {}, using defaults", config_path.display());
            StudioConfig::default()
        };
        Ok(config.with_environment(data_dir))
    }

    /// Like [`StudioConfig::load`], but the YAML comes from `config_path`,
    /// which must exist. `.env` and the database still live in `data_dir`.
    pub fn load_from(config_path: &Path, data_dir: &Path) -> Result<Self, AppError> {
        if !config_path.is_file() {
            return Err(AppError::NotFound(format!(
                "config file {}",
                config_path.display()
            )));
        }
        Ok(Self::read_file(config_path)?.with_environment(data_dir))
    }

    fn read_file(config_path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(config_path)?;
        let config: StudioConfig = serde_yaml::from_str(&raw)?;
        log::info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    fn with_environment(mut self, data_dir: &Path) -> Self {
        if self.database_path.is_none() {
            self.database_path = Some(data_dir.join(DATABASE_FILE));
        }

        self.openai_api_key = lookup_key(data_dir, "OPENAI_API_KEY");
        self.elevenlabs_api_key = lookup_key(data_dir, "ELEVENLABS_API_KEY");
        if let Some(url) = lookup_key(data_dir, "ARAGORNIC_API_URL") {
            self.base_url = url;
        }
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| default_data_dir().join(DATABASE_FILE))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// `.env` wins over the process environment.
fn lookup_key(data_dir: &Path, key: &str) -> Option<String> {
    if let Some(value) = load_env_value(data_dir, key) {
        log::info!("{} loaded from .env", key);
        return Some(value);
    }
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load a value from the .env file by key name
pub fn load_env_value(dir: &Path, key: &str) -> Option<String> {
    let env_path = dir.join(".env");
    let prefix = format!("{}=", key);
    if let Ok(content) = std::fs::read_to_string(&env_path) {
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with(&prefix) {
                let value = trimmed[prefix.len()..]
                    .trim()
                    .trim_matches('"')
                    .trim_matches('\'');
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}
