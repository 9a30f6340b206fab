//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the review core.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Mappers must not read/write rows before migrations succeed.

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Connection handle shared by the OID generator and every mapper.
///
/// SQLite connections are not `Sync`; all access is serialized here.
pub type SharedConnection = Arc<Mutex<rusqlite::Connection>>;

/// Wraps a bootstrapped connection for shared use.
pub fn share(conn: rusqlite::Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
