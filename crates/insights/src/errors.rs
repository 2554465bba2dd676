//! Error types for the engine.

use insights_settings::SettingsError;
use insights_store::StoreError;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by construction and the non-tracking API.
///
/// Tracking calls never return these; they log and drop instead.
#[derive(Debug, Error)]
pub enum InsightsError {
    /// Settings failed validation.
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// Local event store failure.
    #[error("event store error: {0}")]
    Store(#[from] StoreError),

    /// Transport construction or delivery failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Construction outside a Tokio runtime.
    #[error("no tokio runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    /// The serial worker has shut down.
    #[error("event queue is closed")]
    QueueClosed,

    /// The lifecycle listener was removed by `invalidate` / `clear_instance`.
    #[error("lifecycle observer has been removed")]
    ObserverRemoved,
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, InsightsError>;
