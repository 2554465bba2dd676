//! # insights-store
//!
//! Durable local buffer for tracked events.
//!
//! - **[`EventStore`] trait**: the append / count / load-before / delete-before
//!   contract the flush engine depends on
//! - **[`SqliteEventStore`]**: `rusqlite` + `r2d2` implementation with WAL mode
//! - **Repository**: stateless [`EventRepo`] taking `&Connection`
//! - **Migrations**: version-tracked SQL schema evolution
//!
//! Records are keyed by `created_on` (epoch ms) and hold an opaque JSON
//! payload (a serialized [`EventEnvelope`](insights_core::EventEnvelope)).

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use sqlite::connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
pub use sqlite::migrations::run_migrations;
pub use sqlite::repositories::event::EventRepo;
pub use sqlite::row_types::EventRow;
pub use store::{EventStore, SqliteEventStore};
