//! Secrets management for EvalSenior
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/evalsenior/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (GEMINI_API_KEY, then API_KEY)
//! 2. Secrets file (~/.config/evalsenior/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Text-generation credentials
    pub gemini: GeminiSecrets,
}

/// Gemini API credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiSecrets {
    /// API key for the generative language endpoint
    pub api_key: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut key) = secrets.gemini.api_key {
            *key = key.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/evalsenior/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("evalsenior").join("secrets.toml"))
    }

    /// Get the Gemini API key with environment variable override
    ///
    /// Priority: GEMINI_API_KEY > API_KEY > secrets file
    pub fn gemini_api_key(&self) -> Option<String> {
        for var in ["GEMINI_API_KEY", "API_KEY"] {
            if let Ok(key) = std::env::var(var) {
                let key = key.trim().to_string();
                if !key.is_empty() {
                    debug!(var, "Using API key from environment");
                    return Some(key);
                }
            }
        }

        self.file_api_key()
    }

    fn file_api_key(&self) -> Option<String> {
        self.gemini
            .api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .cloned()
    }

    /// Create a template secrets file at the default location
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# EvalSenior Secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[gemini]
# API key used to draft interview syntheses
api_key = ""
"#;

        std::fs::write(&path, template).map_err(Error::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please add your API key");

        Ok(path)
    }
}
