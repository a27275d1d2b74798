//! Store settings
//!
//! Provides [`StoreSettings`], persisted as `settings.toml`, and the
//! [`SettingsProvider`] lookup the store consults at runtime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::state::write_atomic;

/// Setting that overrides the recently used list size
pub const MAX_RECENT_CONNECTIONS_SETTING: &str = "connections.maxRecentConnections";

/// Recently used list size when no override is configured
pub const MAX_RECENT_CONNECTIONS_DEFAULT: usize = 25;

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Application-wide settings lookup
pub trait SettingsProvider: Send + Sync {
    /// Returns a setting's value, if configured
    fn get_value(&self, name: &str) -> Option<Value>;

    /// Configured size of the recently used list.
    ///
    /// Absent or falsy values (`null`, `false`, `0`, `""`) yield the default.
    fn max_recent_connections(&self) -> usize {
        self.get_value(MAX_RECENT_CONNECTIONS_SETTING)
            .and_then(|value| match value {
                Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
                Value::String(s) => s.trim().parse::<usize>().ok(),
                _ => None,
            })
            .filter(|n| *n > 0)
            .unwrap_or(MAX_RECENT_CONNECTIONS_DEFAULT)
    }
}

/// Persisted store settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Maximum number of recently used connections to keep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_recent_connections: Option<usize>,
    /// Directory holding `connections.toml` and `state.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StoreSettings {
    /// Loads settings from a TOML file; a missing file yields defaults
    ///
    /// # Errors
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Saves settings to a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError` if serialization or the write fails.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        write_atomic(path, &content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Directory for profile and state files: `data_dir` or the default
    #[must_use]
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(default_config_dir)
    }
}

impl SettingsProvider for StoreSettings {
    fn get_value(&self, name: &str) -> Option<Value> {
        match name {
            MAX_RECENT_CONNECTIONS_SETTING => self.max_recent_connections.map(Value::from),
            _ => None,
        }
    }
}

/// Default configuration directory: `$XDG_CONFIG_HOME/connstore`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("connstore"))
}
