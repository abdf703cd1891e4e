//! Settings shapes. File keys are camelCase.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use spoticheck_core::protocol::ClientProperties;
use spoticheck_core::WatchedSet;

use crate::errors::{Result, SettingsError};

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?encoding=json";
pub const DEFAULT_DATABASE: &str = "spotify_checker";
pub const DEFAULT_COLLECTION: &str = "spotify_statistics";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpoticheckSettings {
    /// Gateway authentication token.
    pub token: Option<String>,
    pub storage: StorageSettings,
    pub gateway: GatewaySettings,
    /// Identities to record. Empty records everyone.
    pub watched_ids: Vec<String>,
    pub logging: LoggingSettings,
}

impl fmt::Debug for SpoticheckSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpoticheckSettings")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("storage", &self.storage)
            .field("gateway", &self.gateway)
            .field("watched_ids", &self.watched_ids)
            .field("logging", &self.logging)
            .finish()
    }
}

impl SpoticheckSettings {
    /// Check everything the collector needs to start.
    pub fn validate_for_listen(&self) -> Result<()> {
        self.token()?;
        self.storage_uri()?;
        Ok(())
    }

    /// Reports read the store only; no token needed.
    pub fn validate_for_report(&self) -> Result<()> {
        self.storage_uri().map(|_| ())
    }

    pub fn token(&self) -> Result<&str> {
        non_blank(self.token.as_deref()).ok_or(SettingsError::Missing("token"))
    }

    pub fn storage_uri(&self) -> Result<&str> {
        non_blank(self.storage.uri.as_deref()).ok_or(SettingsError::Missing("storage.uri"))
    }

    pub fn watched(&self) -> WatchedSet {
        self.watched_ids.iter().collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Storage location: a directory, `sqlite://<dir>`, or `:memory:`.
    pub uri: Option<String>,
    pub database: String,
    pub collection: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            uri: None,
            database: DEFAULT_DATABASE.into(),
            collection: DEFAULT_COLLECTION.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySettings {
    pub url: String,
    pub properties: ClientProperties,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_GATEWAY_URL.into(),
            properties: ClientProperties::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Raise stdout verbosity to debug.
    pub debug: bool,
    /// Directory for per-run debug log files. `None` disables file logging.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            debug: false,
            dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
        }
    }
}

/// Explicit overrides, typically from command-line flags. Highest priority.
#[derive(Clone, Debug, Default)]
pub struct SettingsOverrides {
    pub token: Option<String>,
    pub storage_uri: Option<String>,
    pub storage_database: Option<String>,
    pub watched: Option<String>,
    pub debug: bool,
    pub gateway_url: Option<String>,
    pub log_dir: Option<PathBuf>,
}
