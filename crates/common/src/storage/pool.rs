//! Plain SQLite connection pool
//!
//! Provides r2d2-based connection pooling for on-disk SQLite databases used
//! by the event store. Unlike the desktop agent this service has no need for
//! at-rest database encryption (SQLCipher) - the host already runs inside a
//! trusted worker environment - so this pool talks to plain `rusqlite`
//! connections with WAL mode and busy-timeout pragmas applied on checkout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection as RusqliteConnection, Row, Statement as RusqliteStatement, ToSql};
use tracing::{debug, info, instrument, warn};

use crate::resilience::{CircuitBreaker, CircuitBreakerConfigBuilder};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::metrics::StorageMetrics;
use crate::storage::types::{
    Connection as ConnectionTrait, ConnectionPool, HealthStatus, PoolMetrics, Transaction,
};

/// SQLite pool configuration
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// Connection acquisition timeout
    pub connection_timeout: Duration,

    /// Busy timeout applied to every connection
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,

    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

fn apply_connection_pragmas(
    conn: &RusqliteConnection,
    config: &SqlitePoolConfig,
) -> rusqlite::Result<()> {
    conn.busy_timeout(config.busy_timeout)?;

    if config.enable_wal {
        conn.pragma_update(None, "journal_mode", "WAL")?;
    }
    if config.enable_foreign_keys {
        conn.pragma_update(None, "foreign_keys", true)?;
    }

    Ok(())
}

/// Pooled SQLite database
///
/// Manages a pool of plain SQLite connections using r2d2, fronted by a
/// circuit breaker so a failing disk doesn't turn every caller into a
/// blocking retry loop.
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
    metrics: Arc<StorageMetrics>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl SqlitePool {
    /// Open (or create) a SQLite database at `path` with the given pool
    /// configuration.
    #[instrument(skip(config), fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        info!("Opening SQLite connection pool");

        let metrics = Arc::new(StorageMetrics::new(config.max_size));
        let pool_config = config.clone();

        let manager = SqliteConnectionManager::file(path)
            .with_init(move |conn| apply_connection_pragmas(conn, &pool_config));

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| StorageError::Connection(format!("Failed to create pool: {}", e)))?;

        // Verify a connection can be acquired before handing the pool back.
        pool.get()
            .map_err(|e| StorageError::Connection(format!("Failed to get test connection: {}", e)))?;

        let circuit_breaker_config = CircuitBreakerConfigBuilder::new()
            .failure_threshold(5)
            .timeout(Duration::from_secs(30))
            .success_threshold(2)
            .half_open_max_calls(3)
            .build()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        let circuit_breaker = Arc::new(
            CircuitBreaker::new(circuit_breaker_config)
                .map_err(|e| StorageError::InvalidConfig(e.to_string()))?,
        );

        info!("SQLite pool opened with {} connections", config.max_size);

        Ok(Self { pool, config, metrics, circuit_breaker })
    }

    /// In-memory pool, useful for tests.
    pub fn in_memory(config: SqlitePoolConfig) -> StorageResult<Self> {
        let metrics = Arc::new(StorageMetrics::new(config.max_size));
        let pool_config = config.clone();

        // A single shared in-memory connection: r2d2 would otherwise hand out
        // independent, isolated in-memory databases per connection.
        let manager = SqliteConnectionManager::memory()
            .with_init(move |conn| apply_connection_pragmas(conn, &pool_config));

        let pool = Pool::builder()
            .max_size(1)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| StorageError::Connection(format!("Failed to create pool: {}", e)))?;

        let circuit_breaker_config = CircuitBreakerConfigBuilder::new()
            .failure_threshold(5)
            .timeout(Duration::from_secs(30))
            .success_threshold(2)
            .half_open_max_calls(3)
            .build()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        let circuit_breaker = Arc::new(
            CircuitBreaker::new(circuit_breaker_config)
                .map_err(|e| StorageError::InvalidConfig(e.to_string()))?,
        );

        Ok(Self { pool, config, metrics, circuit_breaker })
    }

    /// Get the pool metrics
    pub fn metrics(&self) -> &Arc<StorageMetrics> {
        &self.metrics
    }

    /// Get a `SqliteConn` from the pool, subject to the circuit breaker.
    #[instrument(skip(self), fields(pool_size = self.config.max_size))]
    pub fn get_sqlite_connection(&self) -> StorageResult<SqliteConn> {
        let start = std::time::Instant::now();

        if !self.circuit_breaker.can_execute() {
            self.metrics.record_connection_error();
            warn!("Circuit breaker open, rejecting connection request");
            return Err(StorageError::Connection(
                "Circuit breaker open - connection pool temporarily unavailable".to_string(),
            ));
        }

        match self.pool.get() {
            Ok(conn) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                self.metrics.record_connection_acquired(duration_ms);
                self.circuit_breaker.record_success();
                debug!("Connection acquired in {}ms", duration_ms);
                Ok(SqliteConn::new(conn))
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("timeout") {
                    self.metrics.record_connection_timeout();
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    self.metrics.record_connection_error();
                    Err(StorageError::Connection(format!("Failed to get connection: {}", e)))
                }
            }
        }
    }
}

impl ConnectionPool for SqlitePool {
    fn get_connection(&self) -> StorageResult<Box<dyn ConnectionTrait>> {
        self.get_sqlite_connection().map(|c| Box::new(c) as Box<dyn ConnectionTrait>)
    }

    fn health_check(&self) -> StorageResult<HealthStatus> {
        let state = self.pool.state();
        match self.pool.get() {
            Ok(_conn) => Ok(HealthStatus::healthy(
                state.connections as usize,
                state.idle_connections as usize,
                self.config.max_size as usize,
            )),
            Err(e) => Ok(HealthStatus::unhealthy(format!("Pool unhealthy: {}", e))),
        }
    }

    fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            connections_acquired: self
                .metrics
                .connections_acquired
                .load(std::sync::atomic::Ordering::Relaxed),
            connections_timeout: self
                .metrics
                .connections_timeout
                .load(std::sync::atomic::Ordering::Relaxed),
            connections_error: self
                .metrics
                .connections_error
                .load(std::sync::atomic::Ordering::Relaxed),
            avg_acquisition_time_ms: self.metrics.avg_connection_time_ms(),
            queries_executed: self.metrics.queries_executed.load(std::sync::atomic::Ordering::Relaxed),
            queries_failed: self.metrics.queries_failed.load(std::sync::atomic::Ordering::Relaxed),
        }
    }
}

/// Pooled SQLite connection wrapper
pub struct SqliteConn {
    inner: r2d2::PooledConnection<SqliteConnectionManager>,
}

impl SqliteConn {
    fn new(conn: r2d2::PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner: conn }
    }

    /// Borrow the underlying rusqlite connection directly.
    pub fn inner(&self) -> &RusqliteConnection {
        &self.inner
    }

    pub fn query_row<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> StorageResult<T>
    where
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        self.inner.query_row(sql, params, f).map_err(StorageError::from)
    }

    pub fn prepare(&self, sql: &str) -> StorageResult<SqliteStatement<'_>> {
        let stmt = self.inner.prepare(sql).map_err(StorageError::from)?;
        Ok(SqliteStatement::new(stmt))
    }

    pub fn transaction(&mut self) -> StorageResult<Transaction<'_>> {
        let tx = self.inner.transaction().map_err(StorageError::from)?;
        Ok(Transaction::new(tx))
    }
}

impl ConnectionTrait for SqliteConn {
    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> StorageResult<usize> {
        self.inner.execute(sql, params).map_err(StorageError::from)
    }

    fn busy_timeout(&self, timeout_ms: u64) -> StorageResult<()> {
        self.inner
            .busy_timeout(Duration::from_millis(timeout_ms))
            .map_err(StorageError::from)
    }
}

impl std::ops::Deref for SqliteConn {
    type Target = RusqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::ops::DerefMut for SqliteConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Prepared SQLite statement wrapper
pub struct SqliteStatement<'conn> {
    inner: RusqliteStatement<'conn>,
}

impl<'conn> SqliteStatement<'conn> {
    fn new(stmt: RusqliteStatement<'conn>) -> Self {
        Self { inner: stmt }
    }

    pub fn execute(&mut self, params: &[&dyn ToSql]) -> StorageResult<usize> {
        self.inner.execute(params).map_err(StorageError::from)
    }

    pub fn query_map<T, F>(&mut self, params: &[&dyn ToSql], mut f: F) -> StorageResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        let rows = self.inner.query_map(params, |row| f(row)).map_err(StorageError::from)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }
}
