//! Device and OS metadata stamped on every event.
//!
//! [`DeviceInfoProvider`] is queried once per tracked event so values that
//! change at runtime (orientation, screen size) stay current.

use std::fmt;

/// Form factor of the host device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceType {
    /// Handset.
    MobilePhone,
    /// Tablet.
    Tablet,
    /// Desktop or laptop.
    Desktop,
    /// Television.
    Tv,
    /// In-car display.
    CarPlay,
    /// Not known.
    #[default]
    Unknown,
}

impl DeviceType {
    /// Wire value for `dvis`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MobilePhone => "Mobile Phone",
            Self::Tablet => "Tablet",
            Self::Desktop => "Desktop",
            Self::Tv => "TV",
            Self::CarPlay => "CarPlay",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical orientation of the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Upright.
    Portrait,
    /// Upside down.
    PortraitUpsideDown,
    /// Rotated left.
    LandscapeLeft,
    /// Rotated right.
    LandscapeRight,
    /// Lying screen up.
    FaceUp,
    /// Lying screen down.
    FaceDown,
    /// Not known.
    #[default]
    Unknown,
}

impl Orientation {
    /// Wire value for `device_orientation`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::PortraitUpsideDown => "portraitUpsideDown",
            Self::LandscapeLeft => "landscapeLeft",
            Self::LandscapeRight => "landscapeRight",
            Self::FaceUp => "faceUp",
            Self::FaceDown => "faceDown",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of device metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceInfo {
    /// Hardware model identifier.
    pub model: String,
    /// User-visible device name.
    pub name: String,
    /// Form factor.
    pub device_type: DeviceType,
    /// Current orientation.
    pub orientation: Orientation,
    /// Screen width in points.
    pub screen_width: f64,
    /// Screen height in points.
    pub screen_height: f64,
    /// Operating system version.
    pub os_version: String,
    /// Preferred language tag, e.g. `en-US`.
    pub language: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            model: "unknown".into(),
            name: "unknown".into(),
            device_type: DeviceType::Unknown,
            orientation: Orientation::Unknown,
            screen_width: 0.0,
            screen_height: 0.0,
            os_version: "unknown".into(),
            language: DEFAULT_LANGUAGE.into(),
        }
    }
}

/// Language used when the environment names none.
pub const DEFAULT_LANGUAGE: &str = "en-US";

impl DeviceInfo {
    /// Best-effort detection from the running host.
    ///
    /// Desktop hosts have no orientation or fixed screen, so those stay at
    /// their unknown defaults.
    pub fn detect() -> Self {
        let lang = std::env::var("LC_ALL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| std::env::var("LANG").ok());
        Self {
            model: std::env::consts::ARCH.to_string(),
            name: host_name(),
            device_type: DeviceType::Desktop,
            orientation: Orientation::Unknown,
            screen_width: 0.0,
            screen_height: 0.0,
            os_version: os_version(),
            language: preferred_language(lang.as_deref()),
        }
    }
}

/// Convert a POSIX locale (`en_GB.UTF-8`) into a language tag (`en-GB`).
///
/// `C`, `POSIX` and empty values fall back to [`DEFAULT_LANGUAGE`].
pub fn preferred_language(locale: Option<&str>) -> String {
    let Some(locale) = locale else {
        return DEFAULT_LANGUAGE.to_string();
    };
    let base = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return DEFAULT_LANGUAGE.to_string();
    }
    base.replace('_', "-")
}

fn host_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn os_version() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Source of device metadata.
pub trait DeviceInfoProvider: Send + Sync {
    /// Current device metadata.
    fn device_info(&self) -> DeviceInfo;
}

/// Provider returning a fixed snapshot.
#[derive(Clone, Debug, Default)]
pub struct StaticDeviceInfo(pub DeviceInfo);

impl StaticDeviceInfo {
    /// Snapshot the running host once.
    pub fn detect() -> Self {
        Self(DeviceInfo::detect())
    }
}

impl DeviceInfoProvider for StaticDeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_wire_values() {
        assert_eq!(DeviceType::MobilePhone.as_str(), "Mobile Phone");
        assert_eq!(DeviceType::Tv.to_string(), "TV");
        assert_eq!(DeviceType::default(), DeviceType::Unknown);
    }

    #[test]
    fn orientation_wire_values() {
        assert_eq!(Orientation::Portrait.as_str(), "portrait");
        assert_eq!(Orientation::LandscapeLeft.to_string(), "landscapeLeft");
        assert_eq!(Orientation::default().as_str(), "unknown");
    }

    #[test]
    fn preferred_language_from_locale() {
        assert_eq!(preferred_language(Some("en_GB.UTF-8")), "en-GB");
        assert_eq!(preferred_language(Some("de_DE@euro")), "de-DE");
        assert_eq!(preferred_language(Some("fr")), "fr");
    }

    #[test]
    fn preferred_language_fallbacks() {
        assert_eq!(preferred_language(None), "en-US");
        assert_eq!(preferred_language(Some("")), "en-US");
        assert_eq!(preferred_language(Some("C.UTF-8")), "en-US");
        assert_eq!(preferred_language(Some("POSIX")), "en-US");
    }

    #[test]
    fn detect_fills_every_field() {
        let info = DeviceInfo::detect();
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.model, std::env::consts::ARCH);
        assert!(!info.name.is_empty());
        assert!(!info.os_version.is_empty());
        assert!(!info.language.is_empty());
    }

    #[test]
    fn static_provider_returns_snapshot() {
        let info = DeviceInfo {
            model: "iPhone12,1".into(),
            orientation: Orientation::Portrait,
            ..DeviceInfo::default()
        };
        let provider = StaticDeviceInfo(info.clone());
        assert_eq!(provider.device_info(), info);
    }
}
