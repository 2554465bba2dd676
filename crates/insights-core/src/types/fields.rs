use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The flat field record carried in `event_params`.
///
/// Every field is optional and omitted from the wire when `None`. Serde keys
/// are the collector's short field names and double as the whitelist for
/// caller-supplied parameters (see [`EventFields::from_caller_params`]).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFields {
    /// Component that emitted the event.
    #[serde(rename = "comp", skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Country selected in the flow.
    #[serde(rename = "hyperwallet_ea_country", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Currency selected in the flow.
    #[serde(rename = "hyperwallet_ea_currency", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Hardware model identifier.
    #[serde(rename = "dvmdl", skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    /// User-visible device name.
    #[serde(rename = "dvid", skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Device class (phone, tablet, ...).
    #[serde(rename = "dvis", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    /// Error code from [`ErrorInfo`](crate::ErrorInfo).
    #[serde(rename = "error_code", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Error description from [`ErrorInfo`](crate::ErrorInfo).
    #[serde(rename = "error_description", skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Field name the error relates to.
    #[serde(rename = "erfd", skip_serializing_if = "Option::is_none")]
    pub error_field_name: Option<String>,
    /// Error message shown to the user.
    #[serde(rename = "error_message", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Error category.
    #[serde(rename = "error_type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Event kind code (`cl`, `err`, `im`).
    #[serde(rename = "e", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Goal of the current flow.
    #[serde(rename = "goal", skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Deployment environment the events occur in.
    #[serde(rename = "hyperwallet_environment", skip_serializing_if = "Option::is_none")]
    pub hyperwallet_environment: Option<String>,
    /// Program token.
    #[serde(rename = "hyperwallet_is", skip_serializing_if = "Option::is_none")]
    pub hyperwallet_is: Option<String>,
    /// Link (button) clicked, for click events.
    #[serde(rename = "link", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Operating system tag.
    #[serde(rename = "os", skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    /// Operating system version.
    #[serde(rename = "osv", skip_serializing_if = "Option::is_none")]
    pub operating_system_version: Option<String>,
    /// Screen orientation.
    #[serde(rename = "device_orientation", skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// Group of the visible page.
    #[serde(rename = "pgrp", skip_serializing_if = "Option::is_none")]
    pub page_group: Option<String>,
    /// Name of the visible page.
    #[serde(rename = "page", skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
    /// Framework the page is built with.
    #[serde(rename = "pgtf", skip_serializing_if = "Option::is_none")]
    pub page_technology_flag: Option<String>,
    /// Product name.
    #[serde(rename = "product", skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Profile type of the user (individual, business).
    #[serde(rename = "hyperwallet_profile_type", skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,
    /// Preferred language.
    #[serde(rename = "rsta", skip_serializing_if = "Option::is_none")]
    pub rosetta_language: Option<String>,
    /// Screen height in points.
    #[serde(rename = "sh", skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<f64>,
    /// Screen width in points.
    #[serde(rename = "sw", skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<f64>,
    /// Version of the embedding SDK.
    #[serde(rename = "sdk_version", skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    /// Tenant name. The misspelling is part of the wire contract.
    #[serde(rename = "tenent_name", skip_serializing_if = "Option::is_none")]
    pub tenent_name: Option<String>,
    /// Event time in epoch milliseconds.
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Transfer method type selected in the flow.
    #[serde(rename = "hyperwallet_ea_type", skip_serializing_if = "Option::is_none")]
    pub transfer_method_type: Option<String>,
}

impl EventFields {
    /// Decode a loosely typed caller map into fields.
    ///
    /// Keys are matched against the wire names; unknown keys are ignored.
    /// A value that does not fit its field's type (for example a non-numeric
    /// `sh`) fails the whole decode, so callers get all of their fields or
    /// none of them.
    pub fn from_caller_params(params: &HashMap<String, String>) -> serde_json::Result<Self> {
        let map: Map<String, Value> = params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        serde_json::from_value(Value::Object(map))
    }
}
