//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas and apply schema migrations before
//!   returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and applies all pending migrations.
///
/// Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    bootstrap("file", || Connection::open(path.as_ref()))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", Connection::open_in_memory)
}

fn bootstrap(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = open()
        .map_err(Into::into)
        .and_then(|mut conn| -> DbResult<Connection> {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.busy_timeout(Duration::from_secs(5))?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }

    result
}
