use std::path::Path;
use std::sync::Arc;

use insights_core::{Clock, EventEnvelope};
use tracing::{debug, warn};

use super::EventStore;
use crate::errors::Result;
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::event::EventRepo;

/// [`EventStore`] backed by a pooled `SQLite` database.
pub struct SqliteEventStore {
    pool: ConnectionPool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SqliteEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEventStore")
            .field("pool_size", &self.pool.max_size())
            .field("clock", &self.clock)
            .finish()
    }
}

impl SqliteEventStore {
    /// Open (or create) a file-backed store and apply pending migrations.
    pub fn open(path: &Path, config: &ConnectionConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let pool = connection::new_file(path, config)?;
        Self::from_pool(pool, clock)
    }

    /// Fresh in-memory store, mostly for tests and dry runs.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        let pool = connection::new_in_memory(&ConnectionConfig::default())?;
        Self::from_pool(pool, clock)
    }

    fn from_pool(pool: ConnectionPool, clock: Arc<dyn Clock>) -> Result<Self> {
        {
            let conn = pool.get()?;
            let applied = run_migrations(&conn)?;
            if applied > 0 {
                debug!(applied, "event store migrated");
            }
        }
        Ok(Self { pool, clock })
    }

    /// Append a record with an explicit creation time.
    pub fn save_with_timestamp(&self, created_on: i64, payload: &[u8]) -> Result<i64> {
        let conn = self.pool.get()?;
        EventRepo::insert(&conn, created_on, payload)
    }

    /// Creation time of the oldest stored record.
    pub fn oldest_created_on(&self) -> Result<Option<i64>> {
        let conn = self.pool.get()?;
        EventRepo::oldest_created_on(&conn)
    }
}

impl EventStore for SqliteEventStore {
    fn save(&self, payload: &[u8]) -> Result<i64> {
        self.save_with_timestamp(self.clock.now_ms(), payload)
    }

    fn count(&self) -> Result<u64> {
        let conn = self.pool.get()?;
        EventRepo::count(&conn)
    }

    fn load_before(&self, cutoff: i64) -> Result<Vec<EventEnvelope>> {
        let rows = {
            let conn = self.pool.get()?;
            EventRepo::list_before(&conn, cutoff)?
        };
        let envelopes = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_slice::<EventEnvelope>(&row.payload) {
                Ok(envelope) => Some(envelope),
                Err(error) => {
                    warn!(id = row.id, created_on = row.created_on, %error, "skipping undecodable event record");
                    None
                }
            })
            .collect();
        Ok(envelopes)
    }

    fn delete_before(&self, cutoff: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        EventRepo::delete_before(&conn, cutoff)
    }
}
