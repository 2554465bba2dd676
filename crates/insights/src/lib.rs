//! # insights
//!
//! Client-side telemetry engine: records click, error and impression events,
//! buffers them in a local store, and uploads them in batches.
//!
//! - **[`Insights`]**: the handle hosts track events through
//! - **[`EventEnricher`]**: merges caller params, identity, error and device fields
//! - **[`FlushController`]**: single-flight flush with success/failure eviction
//! - **[`Transport`]**: batch delivery, with [`HttpTransport`] as the default
//! - **Lifecycle**: background and termination flushes via [`LifecycleNotifier`]
//! - **[`InsightsRegistry`]**: setup-once process-wide instance
//!
//! Tracking calls never block and never report errors; failures are logged.

#![deny(unsafe_code)]

pub mod client;
pub mod counter;
pub mod device;
pub mod enricher;
pub mod errors;
pub mod flush;
pub mod lifecycle;
pub mod registry;
pub mod transport;
mod worker;

pub use client::{Insights, InsightsBuilder};
pub use counter::BatchCounter;
pub use device::{DeviceInfo, DeviceInfoProvider, DeviceType, Orientation, StaticDeviceInfo};
pub use enricher::{EventEnricher, TrackRequest};
pub use errors::{InsightsError, Result};
pub use flush::{FlushController, FlushOutcome, FlushTrigger};
pub use lifecycle::{
    BackgroundExecutionHost, ExtensionGrant, LifecycleEvent, LifecycleNotifier, NoopBackgroundHost,
};
pub use registry::{InsightsRegistry, clear_instance, setup, shared};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};

pub use insights_core::{ErrorInfo, EventKind};
pub use insights_settings::InsightsSettings;
