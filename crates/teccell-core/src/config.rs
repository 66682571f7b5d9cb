//! Application configuration management.
//!
//! This module handles loading and saving the admin gate configuration:
//! which credential backend to use, how long a session lasts, and the
//! minimum password length enforced by the setup screens.
//!
//! Configuration is stored at `~/.config/teccell-admin/config.json`.
//! `TECCELL_STORE_BACKEND` and `TECCELL_DATA_DIR` override the file.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/data directory paths
const APP_NAME: &str = "teccell-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Sessions last a day unless configured otherwise.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Upper bound on a configured session lifetime (one year).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

const ENV_STORE_BACKEND: &str = "TECCELL_STORE_BACKEND";
const ENV_DATA_DIR: &str = "TECCELL_DATA_DIR";

/// Where the credential record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "keyring" | "keychain" => Ok(StoreBackend::Keyring),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub session_ttl_hours: i64,
    pub min_password_length: usize,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::default(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(ENV_STORE_BACKEND) {
            match value.parse() {
                Ok(backend) => self.store_backend = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_STORE_BACKEND),
            }
        }
        if let Ok(value) = std::env::var(ENV_DATA_DIR) {
            if !value.trim().is_empty() {
                self.data_dir = Some(PathBuf::from(value));
            }
        }
    }

    /// Directory for the credential file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Session lifetime, between one hour and [`MAX_SESSION_TTL_HOURS`].
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }
}
