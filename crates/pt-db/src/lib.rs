//! Storage layer for the pulse time tracker.
//!
//! Pulses are persisted per user and read back by time window. The
//! aggregation engine in `pt-core` never talks to storage directly; callers
//! go through the [`PulseStore`] trait, which has two implementations:
//!
//! - [`Database`]: `rusqlite`-backed, durable.
//! - [`MemoryStore`]: an explicitly owned map with a retention window.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Both stores take `&mut self` for writes; wrap a store in a `Mutex` to share
//! it between threads.
//!
//! # Schema
//!
//! Timestamps are stored as INTEGER epoch milliseconds, exactly as pulses
//! carry them, so range scans on `(user_id, timestamp)` use the index
//! directly. `activity_type` is stored as its canonical string.

mod memory;

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use pt_core::{ActivityType, Pulse, UserId, Window};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use thiserror::Error;

pub use memory::{DEFAULT_RETENTION_DAYS, MemoryStore, StoredPulse};

/// Storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row could not be turned back into a pulse.
    #[error("invalid pulse data in row {row_id}: {message}")]
    InvalidPulseData { row_id: i64, message: String },
}

/// Which backend a store is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Memory,
}

impl Dialect {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Epoch-millisecond cutoff `days` before `now`.
///
/// Negative retention counts as zero. A retention reaching past the earliest
/// instant chrono can represent saturates there, so nothing positive is cut.
pub fn retention_cutoff_ms(now: DateTime<Utc>, days: i64) -> i64 {
    Duration::try_days(days.max(0))
        .and_then(|retention| now.checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .timestamp_millis()
}

/// Optional exact-match filters applied to a window query.
///
/// Empty strings are treated as "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseFilters {
    pub project: Option<String>,
    pub tool: Option<String>,
}

impl PulseFilters {
    fn project(&self) -> Option<&str> {
        self.project.as_deref().filter(|p| !p.is_empty())
    }

    fn tool(&self) -> Option<&str> {
        self.tool.as_deref().filter(|t| !t.is_empty())
    }

    /// Whether a pulse passes every active filter.
    pub fn matches(&self, pulse: &Pulse) -> bool {
        if let Some(project) = self.project() {
            if pulse.project.as_deref() != Some(project) {
                return false;
            }
        }
        if let Some(tool) = self.tool() {
            if pulse.tool != tool {
                return false;
            }
        }
        true
    }
}

/// A place pulses are written to and read back from.
///
/// Returned pulses may come back in any order; the aggregation engine sorts
/// its own copy.
pub trait PulseStore {
    /// Which backend this is.
    fn dialect(&self) -> Dialect;

    /// Stores a batch of pulses for a user. Returns how many were written.
    fn store_for_user(&mut self, user_id: &UserId, pulses: &[Pulse]) -> Result<usize, DbError>;

    /// Pulses for a user with `start_ms <= timestamp <= end_ms`.
    fn query_by_user_and_window(
        &self,
        user_id: &UserId,
        start_ms: i64,
        end_ms: i64,
        filters: &PulseFilters,
    ) -> Result<Vec<Pulse>, DbError>;

    /// Same as [`PulseStore::query_by_user_and_window`], taking a [`Window`].
    fn query_window(
        &self,
        user_id: &UserId,
        window: Window,
        filters: &PulseFilters,
    ) -> Result<Vec<Pulse>, DbError> {
        self.query_by_user_and_window(user_id, window.start_ms, window.end_ms, filters)
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Latest pulse timestamp grouped by tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLastPulse {
    pub tool: String,
    pub last_pulse_ms: i64,
    pub pulse_count: i64,
}

/// A pulse row exactly as stored in SQLite.
struct PulseRow {
    row_id: i64,
    tool: String,
    timestamp: i64,
    activity_type: String,
    project: Option<String>,
    file: Option<String>,
    language: Option<String>,
    branch: Option<String>,
    machine_id: Option<String>,
    is_write: bool,
    lines: Option<i64>,
    cursor_line: Option<i64>,
    tokens_in: Option<i64>,
    tokens_out: Option<i64>,
    session_id: Option<String>,
}

impl PulseRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            row_id: row.get(0)?,
            tool: row.get(1)?,
            timestamp: row.get(2)?,
            activity_type: row.get(3)?,
            project: row.get(4)?,
            file: row.get(5)?,
            language: row.get(6)?,
            branch: row.get(7)?,
            machine_id: row.get(8)?,
            is_write: row.get::<_, i64>(9)? != 0,
            lines: row.get(10)?,
            cursor_line: row.get(11)?,
            tokens_in: row.get(12)?,
            tokens_out: row.get(13)?,
            session_id: row.get(14)?,
        })
    }

    fn into_pulse(self) -> Result<Pulse, DbError> {
        let row_id = self.row_id;
        let activity_type = self
            .activity_type
            .parse::<ActivityType>()
            .map_err(|e| DbError::InvalidPulseData {
                row_id,
                message: e.to_string(),
            })?;
        Ok(Pulse {
            tool: self.tool,
            timestamp: self.timestamp,
            activity_type,
            project: self.project,
            file: self.file,
            language: self.language,
            branch: self.branch,
            machine_id: self.machine_id,
            is_write: self.is_write,
            lines: self.lines,
            cursor_line: self.cursor_line,
            tokens_in: self.tokens_in,
            tokens_out: self.tokens_out,
            session_id: self.session_id,
        })
    }
}

const PULSE_COLUMNS: &str = "id, tool, timestamp, activity_type, project, file, language, \
     branch, machine_id, is_write, lines, cursor_line, tokens_in, tokens_out, session_id";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Pulses table: one row per activity pulse
            -- timestamp: epoch milliseconds
            -- activity_type: coding | debugging | prompting | browsing | idle
            CREATE TABLE IF NOT EXISTS pulses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                tool TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                activity_type TEXT NOT NULL,
                project TEXT,
                file TEXT,
                language TEXT,
                branch TEXT,
                machine_id TEXT,
                is_write INTEGER NOT NULL DEFAULT 0,
                lines INTEGER,
                cursor_line INTEGER,
                tokens_in INTEGER,
                tokens_out INTEGER,
                session_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_pulses_user_timestamp ON pulses(user_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_pulses_project ON pulses(project);
            CREATE INDEX IF NOT EXISTS idx_pulses_tool ON pulses(tool);
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of pulses for a user in one transaction.
    pub fn insert_pulses(&mut self, user_id: &UserId, pulses: &[Pulse]) -> Result<usize, DbError> {
        if pulses.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO pulses
                (user_id, tool, timestamp, activity_type, project, file, language,
                 branch, machine_id, is_write, lines, cursor_line, tokens_in, tokens_out, session_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for pulse in pulses {
                inserted += stmt.execute(params![
                    user_id.as_str(),
                    pulse.tool,
                    pulse.timestamp,
                    pulse.activity_type.as_str(),
                    pulse.project,
                    pulse.file,
                    pulse.language,
                    pulse.branch,
                    pulse.machine_id,
                    i64::from(pulse.is_write),
                    pulse.lines,
                    pulse.cursor_line,
                    pulse.tokens_in,
                    pulse.tokens_out,
                    pulse.session_id,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(user = %user_id, inserted, "stored pulses");
        Ok(inserted)
    }

    /// Lists pulses for a user inside an inclusive window, ordered by time.
    pub fn list_pulses_in_range(
        &self,
        user_id: &UserId,
        start_ms: i64,
        end_ms: i64,
        filters: &PulseFilters,
    ) -> Result<Vec<Pulse>, DbError> {
        let mut sql = format!(
            "SELECT {PULSE_COLUMNS} FROM pulses WHERE user_id = ? AND timestamp >= ? AND timestamp <= ?"
        );
        let mut values = vec![
            Value::Text(user_id.as_str().to_string()),
            Value::Integer(start_ms),
            Value::Integer(end_ms),
        ];
        if let Some(project) = filters.project() {
            sql.push_str(" AND project = ?");
            values.push(Value::Text(project.to_string()));
        }
        if let Some(tool) = filters.tool() {
            sql.push_str(" AND tool = ?");
            values.push(Value::Text(tool.to_string()));
        }
        sql.push_str(" ORDER BY timestamp ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), PulseRow::from_row)?;
        let mut pulses = Vec::new();
        for row in rows {
            pulses.push(row?.into_pulse()?);
        }
        tracing::debug!(user = %user_id, start_ms, end_ms, count = pulses.len(), "queried pulses");
        Ok(pulses)
    }

    /// Lists the last pulse timestamp per tool for a user, most recent first.
    pub fn last_pulse_times_by_tool(&self, user_id: &UserId) -> Result<Vec<ToolLastPulse>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT tool, MAX(timestamp) AS last_pulse, COUNT(*)
            FROM pulses
            WHERE user_id = ?
            GROUP BY tool
            ORDER BY last_pulse DESC, tool ASC
            ",
        )?;
        let rows = stmt.query_map([user_id.as_str()], |row| {
            Ok(ToolLastPulse {
                tool: row.get(0)?,
                last_pulse_ms: row.get(1)?,
                pulse_count: row.get(2)?,
            })
        })?;
        let mut tools = Vec::new();
        for row in rows {
            tools.push(row?);
        }
        Ok(tools)
    }

    /// Deletes every pulse with `timestamp <= cutoff_ms`. Returns rows removed.
    pub fn prune_older_than(&mut self, cutoff_ms: i64) -> Result<usize, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM pulses WHERE timestamp <= ?", [cutoff_ms])?;
        tracing::debug!(cutoff_ms, removed, "pruned pulses");
        Ok(removed)
    }
}

impl PulseStore for Database {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn store_for_user(&mut self, user_id: &UserId, pulses: &[Pulse]) -> Result<usize, DbError> {
        self.insert_pulses(user_id, pulses)
    }

    fn query_by_user_and_window(
        &self,
        user_id: &UserId,
        start_ms: i64,
        end_ms: i64,
        filters: &PulseFilters,
    ) -> Result<Vec<Pulse>, DbError> {
        self.list_pulses_in_range(user_id, start_ms, end_ms, filters)
    }
}
