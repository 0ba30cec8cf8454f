//! Application configuration management.
//!
//! Configuration is stored at `~/.config/orcaflow/config.json`. Environment
//! variables (usually from a `.env` file) override the stored base URL and
//! prefill the login form.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::calendar::ViewMode;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "orcaflow";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Default per-request transport timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "ORCAFLOW_API_URL";
pub const ENV_EMAIL: &str = "ORCAFLOW_EMAIL";
pub const ENV_PASSWORD: &str = "ORCAFLOW_PASSWORD";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    Keyring,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub default_view: ViewMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            last_email: None,
            token_backend: TokenBackend::default(),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_view: ViewMode::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("logs"))
    }

    /// Effective base URL: environment, then config file, then the default.
    pub fn api_base_url(&self) -> String {
        self.resolve_base_url(std::env::var(ENV_API_URL).ok())
    }

    fn resolve_base_url(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base_url.clone().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Email to prefill in the login form.
    pub fn login_email(&self) -> Option<String> {
        std::env::var(ENV_EMAIL)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.last_email.clone())
    }

    pub fn login_password() -> Option<String> {
        std::env::var(ENV_PASSWORD).ok().filter(|v| !v.is_empty())
    }
}
