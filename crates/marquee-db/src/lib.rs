//! Database layer for the Marquee movie service.
//!
//! Provides the SQLite connection pool (via `r2d2`), the per-request
//! [`Session`] guard, and the embedded schema bootstrap. The pool is built
//! once at startup and handed to the server explicitly; nothing in this
//! crate holds global state.
//!
//! # Design decisions
//!
//! - **SQLite file store with WAL mode**: a single file next to the binary,
//!   concurrent readers with one writer.
//! - **`r2d2` connection pool**: bounded connection reuse; a [`Session`]
//!   returns its connection to the pool on drop.
//! - **Embedded migrations**: SQL files are compiled in with `include_str!`
//!   and tracked in `_marquee_migrations`, so bootstrapping on every start
//!   is a no-op once the schema exists.

mod migrations;
mod pool;
mod session;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use session::{Session, SessionError};
