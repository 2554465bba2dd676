//! Package-level and wire-level constants.

/// Current version of the Insights engine (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Channel reported in every event envelope.
pub const CHANNEL: &str = "mobile";

/// Event kind code for clicks (taps).
pub const CLICK: &str = "cl";

/// Event kind code for errors.
pub const ERROR: &str = "err";

/// Event kind code for impressions.
pub const IMPRESSION: &str = "im";

/// Error type used for form validation errors.
pub const ERROR_TYPE_FORM: &str = "FORM";
/// Error type used for API errors.
pub const ERROR_TYPE_API: &str = "API";
/// Error type used for connectivity errors.
pub const ERROR_TYPE_CONNECTION: &str = "CONNECTION";
/// Error type used for unexpected exceptions.
pub const ERROR_TYPE_EXCEPTION: &str = "EXCEPTION";

/// Default component identifier (`comp`).
pub const DEFAULT_COMPONENT: &str = "hwrustsdk";

/// Default product (`product`) when the caller does not supply one.
pub const DEFAULT_PRODUCT: &str = "dropin";

/// Default tenant name (`tenent_name`) when the caller does not supply one.
pub const DEFAULT_TENANT_NAME: &str = "hyperwallet";

/// Default page technology flag (`pgtf`).
pub const DEFAULT_FRAMEWORK_FLAG: &str = "Rust";

/// Stored-event count at which a threshold flush is attempted.
pub const DEFAULT_MAX_BATCH_SIZE: u64 = 10;

/// Age in days after which a stored event is evicted on a failed flush.
pub const DEFAULT_STALE_THRESHOLD_DAYS: u32 = 7;

/// HTTP request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn event_kind_codes() {
        assert_eq!(CLICK, "cl");
        assert_eq!(ERROR, "err");
        assert_eq!(IMPRESSION, "im");
        assert_eq!(CHANNEL, "mobile");
    }

    #[test]
    fn seven_days_in_ms() {
        assert_eq!(
            i64::from(DEFAULT_STALE_THRESHOLD_DAYS) * MS_PER_DAY,
            604_800_000
        );
    }
}
