//! Settings file and authentication.

use std::path::{Path, PathBuf};

use recon_client::ServiceConfig;
use recon_workflow::Authenticator;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the settings file inside the config directory.
pub const SETTINGS_FILE: &str = "config.toml";

/// Errors from loading the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Service connection.
    pub service: ServiceConfig,
    /// Authentication policy.
    pub auth: AuthSettings,
}

/// Authentication policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Refuse to run without an API token.
    pub require_token: bool,
}

impl Settings {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::config_path()),
        }
    }

    /// Load settings from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let settings: Self = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), ?settings, "Settings loaded");
        Ok(settings)
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "Reconciliation", "recon")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
    }

    /// Authenticator for the configured policy.
    pub fn authenticator(&self) -> TokenAuthenticator {
        TokenAuthenticator {
            token: self.service.token().map(str::to_string),
            require_token: self.auth.require_token,
        }
    }
}

/// Signed in when a token is configured, or when no token is required.
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    token: Option<String>,
    require_token: bool,
}

impl Authenticator for TokenAuthenticator {
    fn is_authenticated(&self) -> bool {
        !self.require_token || self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn sign_out(&mut self) {
        self.token = None;
        self.require_token = true;
    }
}
