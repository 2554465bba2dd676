//! Event repository: append, count, range-load and range-delete over the
//! `events` table.

use rusqlite::{Connection, params};

use crate::errors::Result;
use crate::sqlite::row_types::EventRow;

/// Event repository. Stateless, every method takes `&Connection`.
pub struct EventRepo;

impl EventRepo {
    /// Append one record and return its row id.
    pub fn insert(conn: &Connection, created_on: i64, payload: &[u8]) -> Result<i64> {
        let _ = conn.execute(
            "INSERT INTO events (created_on, payload) VALUES (?1, ?2)",
            params![created_on, payload],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Total number of stored records.
    pub fn count(conn: &Connection) -> Result<u64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Records with `created_on <= cutoff`, oldest first.
    pub fn list_before(conn: &Connection, cutoff: i64) -> Result<Vec<EventRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, created_on, payload FROM events
             WHERE created_on <= ?1
             ORDER BY created_on ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![cutoff], |row| {
                Ok(EventRow {
                    id: row.get(0)?,
                    created_on: row.get(1)?,
                    payload: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete records with `created_on <= cutoff`. Returns rows removed.
    pub fn delete_before(conn: &Connection, cutoff: i64) -> Result<usize> {
        let deleted = conn.execute("DELETE FROM events WHERE created_on <= ?1", params![cutoff])?;
        Ok(deleted)
    }

    /// Creation time of the oldest stored record, if any.
    pub fn oldest_created_on(conn: &Connection) -> Result<Option<i64>> {
        let oldest: Option<i64> =
            conn.query_row("SELECT MIN(created_on) FROM events", [], |row| row.get(0))?;
        Ok(oldest)
    }
}
