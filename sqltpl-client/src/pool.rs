//! # Connection Source
//!
//! Purpose: Lease SQLite connections from an `r2d2` pool for the duration of
//! one template operation.
//!
//! ## Design Principles
//! 1. **Borrowed Pooling**: Bounding, reuse and acquire timeouts belong to
//!    `r2d2`; this module only configures it.
//! 2. **Trait Seam**: `QueryTemplate` depends on [`ConnectionSource`], so a
//!    bare `r2d2::Pool` or the configured [`ConnectionPool`] both plug in.
//! 3. **RAII Release**: Leased connections go back to the pool on drop.
//! 4. **Per-Connection Setup**: Busy timeout and pragmas run once when a
//!    physical connection is opened, not on every lease.

use std::fmt;
use std::ops::DerefMut;
use std::path::PathBuf;
use std::time::Duration;

use r2d2::{HandleError, Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::template::{TemplateError, TemplateResult};

/// Anything that can lease an exclusive SQLite connection.
///
/// Implementations must be safe to call from several threads at once and must
/// never hand the same physical connection to two holders.
pub trait ConnectionSource: Send + Sync {
    /// Lease guard; dropping it releases the connection.
    type Connection: DerefMut<Target = Connection>;

    /// Leases a connection, blocking up to the source's timeout.
    fn acquire(&self) -> TemplateResult<Self::Connection>;
}

impl ConnectionSource for Pool<SqliteConnectionManager> {
    type Connection = PooledConnection<SqliteConnectionManager>;

    fn acquire(&self) -> TemplateResult<Self::Connection> {
        self.get().map_err(TemplateError::PoolExhausted)
    }
}

/// Where the pooled connections point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    /// SQLite database file, created if missing.
    File(PathBuf),
    /// Private in-memory database.
    ///
    /// Each physical connection would see its own empty database, so the pool
    /// is capped at one connection.
    Memory,
}

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Database the connections open.
    pub database: Database,
    /// Floor of idle connections the pool keeps open (capped at `max_total`).
    pub min_idle: u32,
    /// Maximum total connections (idle + in-use).
    pub max_total: u32,
    /// How long `acquire` waits for a free connection.
    pub connect_timeout: Option<Duration>,
    /// How long SQLite waits on a locked database before failing a statement.
    pub busy_timeout: Option<Duration>,
    /// Enforce foreign key constraints on every connection.
    pub foreign_keys: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            database: Database::Memory,
            min_idle: 1,
            max_total: 8,
            connect_timeout: Some(Duration::from_secs(30)),
            busy_timeout: Some(Duration::from_secs(5)),
            foreign_keys: true,
        }
    }
}

impl PoolConfig {
    /// Default configuration pointed at a database file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        PoolConfig {
            database: Database::File(path.into()),
            ..PoolConfig::default()
        }
    }
}

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Open physical connections.
    pub connections: u32,
    /// Connections currently sitting in the pool.
    pub idle: u32,
}

impl PoolState {
    /// Connections currently leased out.
    pub fn in_use(&self) -> u32 {
        self.connections.saturating_sub(self.idle)
    }
}

/// Forwards connection failures seen by r2d2's background workers to tracing.
#[derive(Debug)]
struct TracingErrorHandler;

impl<E: fmt::Display> HandleError<E> for TracingErrorHandler {
    fn handle_error(&self, error: E) {
        warn!(error = %error, "pool failed to open connection");
    }
}

/// Configured `r2d2` pool of SQLite connections.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Pool<SqliteConnectionManager>,
}

impl ConnectionPool {
    /// Builds the pool and opens its first `min_idle` connections.
    ///
    /// # Errors
    /// `TemplateError::Connect` when the initial connections cannot be opened
    /// within `connect_timeout`.
    pub fn open(config: PoolConfig) -> TemplateResult<Self> {
        let busy_timeout = config.busy_timeout;
        let foreign_keys = config.foreign_keys;

        let manager = match &config.database {
            Database::File(path) => SqliteConnectionManager::file(path),
            Database::Memory => SqliteConnectionManager::memory(),
        }
        .with_init(move |conn| {
            if let Some(timeout) = busy_timeout {
                conn.busy_timeout(timeout)?;
            }
            if foreign_keys {
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            }
            Ok(())
        });

        // r2d2 panics on a zero-sized pool or min_idle above max_size.
        let max_total = match config.database {
            Database::Memory => 1,
            Database::File(_) => config.max_total.max(1),
        };
        let min_idle = config.min_idle.min(max_total);

        let mut builder = Pool::<SqliteConnectionManager>::builder()
            .max_size(max_total)
            .min_idle(Some(min_idle))
            .error_handler(Box::new(TracingErrorHandler));
        if let Some(timeout) = config.connect_timeout.filter(|t| !t.is_zero()) {
            builder = builder.connection_timeout(timeout);
        }

        let inner = builder.build(manager).map_err(TemplateError::Connect)?;
        info!(
            database = ?config.database,
            max_total,
            min_idle,
            "connection pool ready"
        );
        Ok(ConnectionPool { inner })
    }

    /// Leases a connection from the pool.
    pub fn acquire(&self) -> TemplateResult<PooledConnection<SqliteConnectionManager>> {
        let conn = self.inner.get().map_err(|err| {
            debug!(error = %err, "connection acquire timed out");
            TemplateError::PoolExhausted(err)
        })?;
        Ok(conn)
    }

    pub fn state(&self) -> PoolState {
        let state = self.inner.state();
        PoolState {
            connections: state.connections,
            idle: state.idle_connections,
        }
    }

    pub fn max_size(&self) -> u32 {
        self.inner.max_size()
    }
}

impl ConnectionSource for ConnectionPool {
    type Connection = PooledConnection<SqliteConnectionManager>;

    fn acquire(&self) -> TemplateResult<Self::Connection> {
        ConnectionPool::acquire(self)
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("max_size", &self.max_size())
            .field("state", &self.state())
            .finish()
    }
}
