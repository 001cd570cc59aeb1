// Application configuration
// Data directory layout plus tuning knobs for the brain

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::brain::tokenizer::DEFAULT_MIN_TOKEN_LEN;

/// Name of the optional config file inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "com.ideajar.app";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to get app data directory")]
    NoAppDataDir,
    #[error("Invalid brain.smoothing {0}: must be a positive finite number")]
    InvalidSmoothing(f64),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tokenizer and scoring parameters for the brain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Shortest word that counts as a token
    pub min_token_len: usize,

    /// Additive term inside the log: each count contributes ln(count + smoothing)
    pub smoothing: f64,
}

impl Default for BrainConfig {
    fn default() -> Self {
        BrainConfig {
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            smoothing: 1.0,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for the database and backups
    #[serde(skip)]
    pub data_dir: PathBuf,

    /// SQLite file name inside `data_dir`
    pub database_file: String,

    /// Backup directory name inside `data_dir`
    pub backup_dir_name: String,

    pub brain: BrainConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from("."),
            database_file: "ideajar.db".to_string(),
            backup_dir_name: "backups".to_string(),
            brain: BrainConfig::default(),
        }
    }
}

impl BrainConfig {
    /// Reject values that would make scores NaN or infinite
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 {
            return Err(ConfigError::InvalidSmoothing(self.smoothing));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration for a data directory
    /// A missing config file yields defaults; a malformed one is an error
    pub fn load(data_dir: &Path) -> ConfigResult<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let parsed: AppConfig = serde_json::from_str(&raw)?;
            parsed.brain.validate()?;
            log::info!("Loaded config from {}", path.display());
            parsed
        } else {
            AppConfig::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    /// Load configuration from the platform data directory
    pub fn load_default() -> ConfigResult<Self> {
        let data_dir = default_data_dir()?;
        fs::create_dir_all(&data_dir)?;
        Self::load(&data_dir)
    }

    /// Write the configuration back to `data_dir`
    pub fn save(&self) -> ConfigResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(self.data_dir.join(CONFIG_FILE_NAME), json)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(&self.backup_dir_name)
    }
}

/// Platform data directory for IdeaJar
pub fn default_data_dir() -> ConfigResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoAppDataDir)?;
    Ok(data_dir.join(APP_DIR_NAME))
}
