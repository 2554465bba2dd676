//! The [`EventStore`] contract and its `SQLite` implementation.

mod sqlite_store;

pub use sqlite_store::SqliteEventStore;

use insights_core::EventEnvelope;

use crate::errors::Result;

/// Durable buffer of serialized event envelopes keyed by creation time.
///
/// Implementations must be safe to call from the serial worker and from a
/// concurrently running flush.
pub trait EventStore: Send + Sync {
    /// Append one record stamped with the current clock time.
    fn save(&self, payload: &[u8]) -> Result<i64>;

    /// Number of stored records.
    fn count(&self) -> Result<u64>;

    /// Decoded envelopes with `created_on <= cutoff`, oldest first.
    /// Records that fail to decode are skipped.
    fn load_before(&self, cutoff: i64) -> Result<Vec<EventEnvelope>>;

    /// Delete records with `created_on <= cutoff`, returning how many went.
    fn delete_before(&self, cutoff: i64) -> Result<usize>;
}
