//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`InsightsSettings::default()`]
//! 2. If `~/.insights/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::InsightsSettings;

/// Resolve the path to the settings file (`~/.insights/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".insights").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<InsightsSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<InsightsSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults deep-merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<InsightsSettings> {
    let defaults = serde_json::to_value(InsightsSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut InsightsSettings) {
    // ── Identity ────────────────────────────────────────────────────
    if let Some(v) = read_env_string("INSIGHTS_ENVIRONMENT") {
        settings.environment = v;
    }
    if let Some(v) = read_env_string("INSIGHTS_PROGRAM_TOKEN") {
        settings.program_token = v;
    }
    if let Some(v) = read_env_string("INSIGHTS_SDK_VERSION") {
        settings.sdk_version = v;
    }
    if let Some(v) = read_env_string("INSIGHTS_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = read_env_string("INSIGHTS_USER_TOKEN") {
        settings.user_token = v;
    }

    // ── Batching / transport ────────────────────────────────────────
    if let Some(v) = read_env_u64("INSIGHTS_MAX_BATCH_SIZE", 1, 10_000) {
        settings.batching.max_batch_size = v;
    }
    if let Some(v) = read_env_u32("INSIGHTS_STALE_DAYS", 1, 365) {
        settings.batching.stale_threshold_days = v;
    }
    if let Some(v) = read_env_u64("INSIGHTS_TIMEOUT_MS", 100, 120_000) {
        settings.transport.timeout_ms = v;
    }

    // ── Storage / logging ───────────────────────────────────────────
    if let Some(v) = read_env_string("INSIGHTS_DB_PATH") {
        settings.storage.database_path = Some(v);
    }
    if let Some(v) = read_env_string("INSIGHTS_LOG_LEVEL") {
        if is_log_level(&v) {
            settings.logging.level = v.to_lowercase();
        } else {
            tracing::warn!(key = "INSIGHTS_LOG_LEVEL", value = %v, "invalid log level, ignoring");
        }
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Whether `val` names a `tracing` level (case-insensitive).
pub fn is_log_level(val: &str) -> bool {
    matches!(
        val.to_lowercase().as_str(),
        "error" | "warn" | "info" | "debug" | "trace"
    )
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"batching": {"maxBatchSize": 10, "staleThresholdDays": 7}});
        let source = serde_json::json!({"batching": {"maxBatchSize": 50}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["batching"]["maxBatchSize"], 50);
        assert_eq!(merged["batching"]["staleThresholdDays"], 7);
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"apiUrl": "http://a"});
        let source = serde_json::json!({"apiUrl": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["apiUrl"], "http://a");
    }

    #[test]
    fn merge_adds_new_keys() {
        let merged = deep_merge(serde_json::json!({}), serde_json::json!({"x": [1, 2]}));
        assert_eq!(merged["x"], serde_json::json!([1, 2]));
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_file_layer(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, InsightsSettings::default());
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "environment": "UAT",
                "apiUrl": "https://collector.test/events",
                "transport": {"acceptLanguage": "fr-CA"},
                "storage": {"databasePath": "/tmp/x.db"}
            }"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.environment, "UAT");
        assert_eq!(settings.api_url, "https://collector.test/events");
        assert_eq!(settings.transport.accept_language.as_deref(), Some("fr-CA"));
        assert_eq!(settings.transport.timeout_ms, 5_000);
        assert_eq!(settings.storage.database_path.as_deref(), Some("/tmp/x.db"));
        assert_eq!(settings.batching.max_batch_size, 10);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_file_layer(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn wrong_typed_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"batching": {"maxBatchSize": "ten"}}"#).unwrap();
        assert!(load_file_layer(&path).is_err());
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_u64_in_range() {
        assert_eq!(parse_u64_range("25", 1, 100), Some(25));
        assert_eq!(parse_u64_range("0", 1, 100), None);
        assert_eq!(parse_u64_range("101", 1, 100), None);
        assert_eq!(parse_u64_range("abc", 1, 100), None);
    }

    #[test]
    fn parse_u32_in_range() {
        assert_eq!(parse_u32_range("7", 1, 365), Some(7));
        assert_eq!(parse_u32_range("366", 1, 365), None);
        assert_eq!(parse_u32_range("-1", 1, 365), None);
    }

    #[test]
    fn log_levels() {
        assert!(is_log_level("debug"));
        assert!(is_log_level("WARN"));
        assert!(!is_log_level("verbose"));
    }
}
