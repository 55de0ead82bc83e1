//! Configuration module
//!
//! Stores the access key, secret key and region as JSON under the
//! application directory (`~/.s3lift/config.json`). The transfer core
//! treats missing credentials as the caller's precondition failure; this
//! module only loads and saves them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application directory name under the user's home.
pub const APP_DIR_NAME: &str = ".s3lift";
/// Config file name inside the application directory.
pub const CONFIG_FILE: &str = "config.json";

pub const MSG_CONFIGURE_CREDENTIALS: &str = "Please configure the AWS credentials";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Stored credentials and region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsConfig {
    #[serde(rename = "key")]
    pub access_key: String,
    #[serde(rename = "secret")]
    pub secret_key: String,
    pub region: String,
}

impl CredentialsConfig {
    /// All three values must be present for a transfer run to start.
    pub fn is_complete(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty() && !self.region.is_empty()
    }
}

/// On-disk location of the config file.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the default location, `~/.s3lift/config.json`.
    pub fn default_location() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self {
            path: home.join(APP_DIR_NAME).join(CONFIG_FILE),
        })
    }

    /// Store at an explicit path (tests).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the config file lives in; failure logs land beneath it.
    pub fn app_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load stored credentials, `None` when no config file exists yet.
    pub fn load(&self) -> Result<Option<CredentialsConfig>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, config: &CredentialsConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
