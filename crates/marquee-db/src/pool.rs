//! The process-wide SQLite pool.
//!
//! Built once in `main` from `[database]` config and moved into the
//! application state. Every connection it opens runs in WAL mode with the
//! configured busy timeout.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;
use thiserror::Error;

/// Pool tunables, mirrored from the `[database]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on open connections. Must be at least 1.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

impl DbRuntimeSettings {
    fn validate(&self) -> Result<(), PoolError> {
        if self.pool_max_size == 0 {
            return Err(PoolError::InvalidSettings(
                "pool_max_size must be at least 1",
            ));
        }
        Ok(())
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid database settings: {0}")]
    InvalidSettings(&'static str),

    #[error("failed to open database pool: {0}")]
    PoolInit(#[from] r2d2::Error),

    #[error("failed to configure database connection: {0}")]
    Configure(#[from] rusqlite::Error),

    /// SQLite silently keeps the old mode on filesystems without shared
    /// memory support.
    #[error("database refused WAL journal mode (got {0})")]
    JournalMode(String),
}

fn init_connection(conn: &mut Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    })?;
    conn.busy_timeout(busy_timeout)
}

/// Opens (creating if needed) the database file at `db_path` and builds a
/// pool over it.
///
/// # Errors
///
/// - `InvalidSettings` for a zero-sized pool
/// - `PoolInit` if connections cannot be opened, e.g. the parent directory
///   of `db_path` does not exist
/// - `JournalMode` if the file cannot be switched to WAL
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    settings.validate()?;

    let busy_timeout = Duration::from_millis(settings.busy_timeout_ms);
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(move |conn| init_connection(conn, busy_timeout));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    let journal_mode: String = pool
        .get()?
        .pragma_query_value(None, "journal_mode", |row| row.get(0))?;
    if !journal_mode.eq_ignore_ascii_case("wal") {
        return Err(PoolError::JournalMode(journal_mode));
    }

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        busy_timeout_ms = settings.busy_timeout_ms,
        "database pool ready"
    );

    Ok(pool)
}
