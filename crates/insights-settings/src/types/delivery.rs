//! Batching and transport settings.

use std::time::Duration;

use insights_core::constants::{
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_STALE_THRESHOLD_DAYS, MS_PER_DAY,
};
use serde::{Deserialize, Serialize};

/// When to flush and how long to keep undelivered events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchingSettings {
    /// Stored-event count that triggers a flush attempt (default: 10).
    pub max_batch_size: u64,
    /// Age in days after which undelivered events are evicted on a failed
    /// flush (default: 7).
    pub stale_threshold_days: u32,
    /// Capacity of the tracking queue; events beyond it are dropped
    /// (default: 1024).
    pub queue_capacity: usize,
}

impl BatchingSettings {
    /// Staleness window in milliseconds.
    pub fn stale_threshold_ms(&self) -> i64 {
        i64::from(self.stale_threshold_days) * MS_PER_DAY
    }
}

impl Default for BatchingSettings {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            stale_threshold_days: DEFAULT_STALE_THRESHOLD_DAYS,
            queue_capacity: 1024,
        }
    }
}

/// HTTP transport settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportSettings {
    /// Request timeout in milliseconds (default: 5000).
    pub timeout_ms: u64,
    /// `Accept-Language` header; detected from the host locale when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
    /// `User-Agent` header; built from SDK and OS versions when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl TransportSettings {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            accept_language: None,
            user_agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_threshold_in_ms() {
        let b = BatchingSettings::default();
        assert_eq!(b.stale_threshold_ms(), 7 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn timeout_duration() {
        assert_eq!(TransportSettings::default().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn optional_headers_omitted_when_unset() {
        let json = serde_json::to_value(TransportSettings::default()).unwrap();
        assert!(json.get("acceptLanguage").is_none());
        assert!(json.get("userAgent").is_none());
    }
}
