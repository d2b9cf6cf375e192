//! Configuration management for EvalSenior
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (EVALSENIOR_*)
//! 3. Config file (~/.config/evalsenior/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Store endpoint used when nothing else is configured
pub const DEFAULT_DB_URL: &str = "https://script.google.com/macros/s/AKfycbx30I5HGX7GBrJksrtjrU-s0BBlSupVFF2Bi-b_gLddoogDIufUHFXNE2sEd2OACsjx/exec";

/// Record store settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Record store endpoint
    pub db_url: Option<String>,

    /// Reporting sheet opened from the dashboard
    pub sheet_url: Option<String>,

    /// Transport timeout for store requests (none by default)
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<Duration>,
}

/// Application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL that shareable employee links point at
    pub base_url: String,

    /// Password gating manager access
    pub manager_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173/".to_string(),
            manager_password: "admin".to_string(),
        }
    }
}

/// Text-generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Model used to draft syntheses
    pub model: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub app: AppConfig,
    pub synthesis: SynthesisConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Persist configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_config_path()
            .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?;
        self.save_to_file(&path)?;
        Ok(path)
    }

    /// Persist configuration to a specific file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/evalsenior/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("evalsenior").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - EVALSENIOR_DB_URL: Record store endpoint
    /// - EVALSENIOR_SHEET_URL: Reporting sheet
    /// - EVALSENIOR_BASE_URL: Base URL for shareable links
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(db_url) = std::env::var("EVALSENIOR_DB_URL") {
            self.store.db_url = Some(db_url);
        }

        if let Ok(sheet_url) = std::env::var("EVALSENIOR_SHEET_URL") {
            self.store.sheet_url = Some(sheet_url);
        }

        if let Ok(base_url) = std::env::var("EVALSENIOR_BASE_URL") {
            self.app.base_url = base_url;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, db_url: Option<String>) -> Self {
        if let Some(url) = db_url {
            self.store.db_url = Some(url);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(db_url: Option<String>) -> Result<Self> {
        Ok(Self::load()?.with_env_overrides().with_cli_overrides(db_url))
    }

    /// The endpoint to talk to: the configured one when usable, else the default
    pub fn active_db_url(&self) -> String {
        match self.store.db_url.as_deref().map(str::trim) {
            Some(url) if is_http_url(url) => url.to_string(),
            _ => DEFAULT_DB_URL.to_string(),
        }
    }
}

/// Check that a string looks like an absolute http(s) URL
pub fn is_http_url(s: &str) -> bool {
    (s.starts_with("http://") || s.starts_with("https://")) && url::Url::parse(s).is_ok()
}
