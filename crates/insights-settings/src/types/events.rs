//! Default values stamped on every event.

use insights_core::constants::{
    DEFAULT_COMPONENT, DEFAULT_FRAMEWORK_FLAG, DEFAULT_PRODUCT, DEFAULT_TENANT_NAME,
};
use serde::{Deserialize, Serialize};

/// Values the enricher writes into generic fields.
///
/// `component`, `operating_system`, and `framework_flag` always override
/// caller input; `product` and `tenant_name` only fill in when the caller
/// supplied none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDefaults {
    /// Component identifier (`comp`).
    pub component: String,
    /// Product (`product`).
    pub product: String,
    /// Tenant name (`tenent_name`).
    pub tenant_name: String,
    /// Operating system tag (`os`).
    pub operating_system: String,
    /// Page technology flag (`pgtf`).
    pub framework_flag: String,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            component: DEFAULT_COMPONENT.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            tenant_name: DEFAULT_TENANT_NAME.to_string(),
            operating_system: std::env::consts::OS.to_string(),
            framework_flag: DEFAULT_FRAMEWORK_FLAG.to_string(),
        }
    }
}
