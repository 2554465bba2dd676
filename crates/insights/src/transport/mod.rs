//! Batch delivery.
//!
//! [`Transport`] is the seam the flush engine sends through; [`HttpTransport`]
//! is the `reqwest` implementation used by default.

mod http;

pub use http::{HttpTransport, user_agent};

use async_trait::async_trait;
use bytes::Bytes;
use insights_core::EventBatch;
use thiserror::Error;

/// Transport failures. Any of these counts as a failed flush.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection or protocol failure.
    #[error("http request failed: {message}")]
    Http {
        /// Underlying error description.
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The transport was invalidated and accepts no further sends.
    #[error("transport has been invalidated")]
    Invalidated,

    /// The batch could not be serialized.
    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    /// A configured header value is not valid HTTP.
    #[error("invalid value for header {name}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
    },
}

/// Status and body of a completed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body, when one was read.
    pub body: Option<Bytes>,
}

impl TransportResponse {
    /// Response with a status and no body.
    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    /// Whether the collector accepted the batch (any 2xx).
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Sends event batches to the collector.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one batch.
    async fn send(&self, batch: &EventBatch) -> Result<TransportResponse, TransportError>;

    /// Stop accepting sends. Later calls to [`send`](Transport::send) fail
    /// with [`TransportError::Invalidated`].
    fn invalidate(&self);
}
