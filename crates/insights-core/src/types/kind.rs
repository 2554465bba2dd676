use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants;

/// The kind of tracking call that produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A click or tap on a named link (`cl`).
    #[serde(rename = "cl")]
    Click,
    /// An error shown to or hit by the user (`err`).
    #[serde(rename = "err")]
    Error,
    /// A page or screen becoming visible (`im`).
    #[serde(rename = "im")]
    Impression,
}

impl EventKind {
    /// Wire code written to the `e` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => constants::CLICK,
            Self::Error => constants::ERROR,
            Self::Impression => constants::IMPRESSION,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
