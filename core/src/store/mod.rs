//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods; it never executes SQL directly.
//! Uniqueness and referential constraints live in the schema, not in code.

mod advertiser;
mod campaign;
mod client;
mod ledger;
mod ml_score;
mod stats;

pub use ledger::InsertOutcome;
pub use stats::LedgerDayRow;

use crate::{error::EngineResult, types::Day};
use rusqlite::{params, Connection};
use std::time::Duration;

/// How long a writer waits for a concurrent writer before failing.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct AdStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
    busy_timeout_ms: u64,
}

impl AdStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    pub fn open_with_timeout(path: &str, busy_timeout_ms: u64) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
            busy_timeout_ms,
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> EngineResult<Self> {
        match &self.path {
            Some(p) => Self::open_with_timeout(p, self.busy_timeout_ms),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_entities.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_ledger.sql"))?;
        Ok(())
    }

    // ── Clock ──────────────────────────────────────────────────

    pub fn clock_day(&self) -> EngineResult<Day> {
        let day = self
            .conn
            .query_row("SELECT day FROM sim_clock WHERE id = 1", [], |row| row.get(0))?;
        Ok(day)
    }

    pub fn set_clock_day(&self, day: Day) -> EngineResult<()> {
        self.conn
            .execute("UPDATE sim_clock SET day = ?1 WHERE id = 1", params![day])?;
        Ok(())
    }

    /// Increment the stored day in a single statement and return the result.
    pub fn increment_clock_day(&self) -> EngineResult<Day> {
        let day = self.conn.query_row(
            "UPDATE sim_clock SET day = day + 1 WHERE id = 1 RETURNING day",
            [],
            |row| row.get(0),
        )?;
        Ok(day)
    }
}

/// Which schema constraint rejected a write, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintKind {
    Unique,
    ForeignKey,
}

pub(crate) fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    use rusqlite::ffi;
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            match e.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    Some(ConstraintKind::Unique)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintKind::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}
