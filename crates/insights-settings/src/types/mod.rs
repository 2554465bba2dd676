//! Settings types.
//!
//! All structs use `#[serde(rename_all = "camelCase", default)]` so a partial
//! JSON file deserializes with compiled defaults filling the gaps.

mod delivery;
mod events;
mod storage;

pub use delivery::{BatchingSettings, TransportSettings};
pub use events::EventDefaults;
pub use storage::StorageSettings;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings for one Insights instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsightsSettings {
    /// Environment events occur in (PROD, UAT, ...).
    pub environment: String,
    /// Program token, reported as `hyperwallet_is`.
    pub program_token: String,
    /// Version of the embedding SDK, reported as `sdk_version`.
    pub sdk_version: String,
    /// Collector endpoint batches are POSTed to.
    pub api_url: String,
    /// Token of the tracked user, reported as the visitor id.
    pub user_token: String,
    /// Batch threshold, staleness window, and queue sizing.
    pub batching: BatchingSettings,
    /// HTTP transport tuning.
    pub transport: TransportSettings,
    /// Local event database.
    pub storage: StorageSettings,
    /// Default values stamped on every event.
    pub event_defaults: EventDefaults,
    /// Log output.
    pub logging: LoggingSettings,
}

impl InsightsSettings {
    /// Defaults with the five identity values filled in.
    pub fn new(
        environment: impl Into<String>,
        program_token: impl Into<String>,
        sdk_version: impl Into<String>,
        api_url: impl Into<String>,
        user_token: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            program_token: program_token.into(),
            sdk_version: sdk_version.into(),
            api_url: api_url.into(),
            user_token: user_token.into(),
            ..Self::default()
        }
    }

    /// Check values the engine cannot run without.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(SettingsError::InvalidValue(
                "apiUrl must not be empty".into(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidValue(format!(
                "apiUrl must be an http(s) URL, got {url}"
            )));
        }
        if self.batching.max_batch_size == 0 {
            return Err(SettingsError::InvalidValue(
                "batching.maxBatchSize must be at least 1".into(),
            ));
        }
        if self.batching.stale_threshold_days == 0 {
            return Err(SettingsError::InvalidValue(
                "batching.staleThresholdDays must be at least 1".into(),
            ));
        }
        if self.batching.queue_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "batching.queueCapacity must be at least 1".into(),
            ));
        }
        if self.transport.timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "transport.timeoutMs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
