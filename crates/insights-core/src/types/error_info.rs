use serde::{Deserialize, Serialize};

/// Describes an error that occurred on a tracked page.
///
/// Folded into the event's `error_*` fields on `track_error` calls; never
/// persisted on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// Error category. One of `API`, `FORM`, `CONNECTION`, `EXCEPTION`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message shown to the user.
    pub message: String,
    /// Field the error relates to, for `FORM` and field-level `API` errors.
    pub field_name: String,
    /// Detailed source of the error, such as a stack trace for `EXCEPTION`.
    pub description: String,
    /// Machine-readable code (`empty`, `pattern`, `CONSTRAINT_VIOLATIONS`, ...).
    pub code: String,
}

impl ErrorInfo {
    /// Build an `ErrorInfo` from its five parts.
    pub fn new(
        error_type: impl Into<String>,
        message: impl Into<String>,
        field_name: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            field_name: field_name.into(),
            description: description.into(),
            code: code.into(),
        }
    }
}
