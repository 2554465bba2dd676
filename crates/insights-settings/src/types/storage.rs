//! Local event database settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where and how events are persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Path of the `SQLite` database. Defaults to `~/.insights/events.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    /// Maximum pooled connections (default: 4).
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds (default: 5000).
    pub busy_timeout_ms: u32,
}

impl StorageSettings {
    /// Configured database path, or the default under `$HOME/.insights`.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path.as_ref().map_or_else(
            || {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".insights").join("events.db")
            },
            PathBuf::from,
        )
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            pool_size: 4,
            busy_timeout_ms: 5_000,
        }
    }
}
