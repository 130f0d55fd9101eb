//! Request-scoped database sessions.
//!
//! A [`Session`] owns one pooled connection for the lifetime of a request.
//! Writes go through [`Session::unit_of_work`], which must be committed
//! explicitly; dropping it uncommitted rolls back. Dropping the session
//! hands the connection back to the pool, whichever way the request ended.

use crate::DbPool;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction};
use std::time::Instant;
use thiserror::Error;

/// Errors raised while opening or using a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No connection could be checked out of the pool.
    #[error("failed to check out database connection: {0}")]
    Checkout(#[from] r2d2::Error),

    /// The connection refused to start a transaction.
    #[error("failed to begin unit of work: {0}")]
    Begin(#[from] rusqlite::Error),
}

/// A database session scoped to a single request.
pub struct Session {
    conn: PooledConnection<SqliteConnectionManager>,
    opened_at: Instant,
}

impl Session {
    /// Checks a connection out of `pool`.
    ///
    /// Blocks until a connection is free or the pool's checkout timeout
    /// elapses, so call it off the async executor.
    pub fn open(pool: &DbPool) -> Result<Self, SessionError> {
        let conn = pool.get()?;
        tracing::trace!("session opened");
        Ok(Self {
            conn,
            opened_at: Instant::now(),
        })
    }

    /// Read access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begins a transaction on this session's connection.
    ///
    /// The returned transaction rolls back on drop unless committed.
    pub fn unit_of_work(&mut self) -> Result<Transaction<'_>, SessionError> {
        Ok(self.conn.transaction()?)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::trace!(
            elapsed_us = self.opened_at.elapsed().as_micros() as u64,
            "session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, DbRuntimeSettings};

    fn file_pool(dir: &tempfile::TempDir, max_size: u32) -> DbPool {
        let path = dir.path().join("session.db");
        create_pool(
            path.to_str().expect("utf-8 path"),
            DbRuntimeSettings {
                busy_timeout_ms: 1_000,
                pool_max_size: max_size,
            },
        )
        .expect("pool creation should succeed")
    }

    #[test]
    fn dropped_session_returns_connection_to_pool() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = file_pool(&dir, 1);

        {
            let _session = Session::open(&pool).expect("should open session");
            assert_eq!(pool.state().idle_connections, 0);
        }

        assert_eq!(pool.state().idle_connections, 1);
        Session::open(&pool).expect("connection should be reusable after drop");
    }

    #[test]
    fn uncommitted_unit_of_work_rolls_back() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = file_pool(&dir, 2);

        let mut session = Session::open(&pool).expect("should open session");
        session
            .connection()
            .execute_batch("CREATE TABLE probe (id INTEGER PRIMARY KEY);")
            .expect("should create probe table");

        {
            let tx = session.unit_of_work().expect("should begin");
            tx.execute("INSERT INTO probe (id) VALUES (1)", [])
                .expect("should insert");
        }

        {
            let tx = session.unit_of_work().expect("should begin");
            tx.execute("INSERT INTO probe (id) VALUES (2)", [])
                .expect("should insert");
            tx.commit().expect("should commit");
        }

        let ids: Vec<i64> = session
            .connection()
            .prepare("SELECT id FROM probe ORDER BY id")
            .expect("should prepare")
            .query_map([], |row| row.get(0))
            .expect("should query")
            .collect::<Result<_, _>>()
            .expect("should read ids");
        assert_eq!(ids, vec![2]);
    }
}
