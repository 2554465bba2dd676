//! # insights-core
//!
//! Foundation types for the Insights telemetry engine.
//!
//! This crate provides the shared vocabulary that the other Insights crates
//! depend on:
//!
//! - **Wire types**: [`EventFields`], [`EventEnvelope`], [`Actor`], [`EventBatch`]
//!   serialized with the exact collector field keys
//! - **Tracking inputs**: [`EventKind`] and [`ErrorInfo`]
//! - **Constants**: channel, event kind codes, batching defaults
//! - **Clock**: [`Clock`] abstraction so stores and the flush engine can be
//!   driven deterministically in tests
//! - **Logging**: `tracing` subscriber setup and log capture for tests

#![deny(unsafe_code)]

pub mod clock;
pub mod constants;
pub mod logging;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use types::{Actor, ErrorInfo, EventBatch, EventEnvelope, EventFields, EventKind};
