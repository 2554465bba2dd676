//! # insights-settings
//!
//! Configuration management with layered sources for the Insights engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`InsightsSettings::default()`]
//! 2. **User file**: `~/.insights/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `INSIGHTS_*` overrides (highest priority)
//!
//! The five identity values passed to `setup` (environment, program token,
//! SDK version, API URL, user token) live at the top level; everything else
//! is grouped into sections.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = InsightsSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_match_engine_constants() {
        let settings = InsightsSettings::default();
        assert_eq!(settings.batching.max_batch_size, 10);
        assert_eq!(settings.batching.stale_threshold_days, 7);
        assert_eq!(settings.transport.timeout_ms, 5_000);
        assert_eq!(settings.event_defaults.component, "hwrustsdk");
        assert_eq!(settings.event_defaults.product, "dropin");
        assert_eq!(settings.event_defaults.tenant_name, "hyperwallet");
        assert_eq!(settings.logging.level, "warn");
        assert!(settings.storage.database_path.is_none());
    }
}
