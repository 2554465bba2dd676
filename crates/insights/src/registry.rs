//! Setup-once instance registry.
//!
//! The first successful `setup` wins; later calls return the existing
//! instance untouched until `clear_instance` removes it. A process-wide
//! registry backs the free functions [`setup`], [`shared`] and
//! [`clear_instance`]; tests construct their own [`InsightsRegistry`].

use std::sync::Arc;

use insights_settings::InsightsSettings;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::client::Insights;
use crate::errors::Result;

/// Holds at most one [`Insights`] instance.
#[derive(Debug)]
pub struct InsightsRegistry {
    slot: Mutex<Option<Arc<Insights>>>,
}

impl Default for InsightsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightsRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            slot: parking_lot::const_mutex(None),
        }
    }

    /// Create the instance from the five identity values and default
    /// settings, unless one already exists.
    pub fn setup(
        &self,
        environment: &str,
        program_token: &str,
        sdk_version: &str,
        api_url: &str,
        user_token: &str,
    ) -> Result<Arc<Insights>> {
        let settings =
            InsightsSettings::new(environment, program_token, sdk_version, api_url, user_token);
        self.setup_with(|| Insights::builder(settings).build())
    }

    /// Create the instance with `build` unless one already exists.
    ///
    /// `build` runs only when the registry is empty.
    pub fn setup_with<F>(&self, build: F) -> Result<Arc<Insights>>
    where
        F: FnOnce() -> Result<Insights>,
    {
        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref() {
            debug!(visit_id = existing.visit_id(), "insights already set up, ignoring");
            return Ok(Arc::clone(existing));
        }
        let instance = Arc::new(build()?);
        *slot = Some(Arc::clone(&instance));
        Ok(instance)
    }

    /// The current instance, if set up.
    pub fn shared(&self) -> Option<Arc<Insights>> {
        self.slot.lock().clone()
    }

    /// Invalidate and remove the current instance.
    pub fn clear_instance(&self) {
        if let Some(instance) = self.slot.lock().take() {
            instance.invalidate();
            info!(visit_id = instance.visit_id(), "insights instance cleared");
        }
    }
}

static GLOBAL: InsightsRegistry = InsightsRegistry::new();

/// Set up the process-wide instance. See [`InsightsRegistry::setup`].
pub fn setup(
    environment: &str,
    program_token: &str,
    sdk_version: &str,
    api_url: &str,
    user_token: &str,
) -> Result<Arc<Insights>> {
    GLOBAL.setup(environment, program_token, sdk_version, api_url, user_token)
}

/// The process-wide instance, if set up.
pub fn shared() -> Option<Arc<Insights>> {
    GLOBAL.shared()
}

/// Invalidate and remove the process-wide instance.
pub fn clear_instance() {
    GLOBAL.clear_instance();
}
