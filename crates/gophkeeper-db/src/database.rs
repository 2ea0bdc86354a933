//! Shared database handle.
//!
//! The server handles requests concurrently; `rusqlite::Connection` is not
//! `Sync`, so the handle serializes access behind a `Mutex`: only one worker
//! touches the connection at a time, and every call crosses `spawn_blocking`
//! from the async handlers in `gophkeeper-server`.

use std::path::Path;
use std::sync::Mutex;

use gophkeeper_core::GophkeeperError;
use rusqlite::Connection;

use crate::schema::INIT_SQL;

/// A SQLite-backed database handle, already schema-bootstrapped.
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (creating if absent) the database file at `path` and run the
    /// schema bootstrap.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GophkeeperError> {
        let conn = Connection::open(path).map_err(GophkeeperError::internal)?;
        Self::bootstrap(conn)
    }

    /// Open an in-memory database (used by tests and `DATABASE_DSN=:memory:`).
    pub fn open_in_memory() -> Result<Self, GophkeeperError> {
        let conn = Connection::open_in_memory().map_err(GophkeeperError::internal)?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, GophkeeperError> {
        conn.execute_batch(INIT_SQL).map_err(GophkeeperError::internal)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}
