//! Plain row structs mirroring table columns.

/// One row of the `events` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRow {
    /// Autoincrement row id; tiebreaker for equal `created_on`.
    pub id: i64,
    /// Creation time in epoch milliseconds.
    pub created_on: i64,
    /// Serialized event envelope.
    pub payload: Vec<u8>,
}
