//! `SQLite` backend: connection pool, migrations, repository, row types.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod row_types;
