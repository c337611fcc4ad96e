//! Core storage trait definitions
//!
//! This module defines platform-agnostic traits that allow different storage
//! backends (SQLCipher, PostgreSQL, etc.) to be used interchangeably.

use std::fmt::Debug;

use rusqlite::{ToSql, Transaction as RusqliteTransaction};

use super::error::{StorageError, StorageResult};

/// Platform-agnostic connection pool trait
///
/// Implementations must provide thread-safe access to database connections.
pub trait ConnectionPool: Send + Sync + Debug {
    /// Get a connection from the pool
    ///
    /// This may block if the pool is exhausted, up to the configured timeout.
    /// Returns a boxed SqliteConn (concrete type, not trait object)
    fn get_connection(&self) -> StorageResult<Box<dyn Connection>>;

    /// Check pool health
    fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get pool metrics
    fn metrics(&self) -> PoolMetrics;
}

/// Platform-agnostic database connection
///
/// Note: This is a marker trait. Actual operations use the SqliteConn
/// concrete type to avoid trait object safety issues.
pub trait Connection: Send {
    /// Execute a SQL statement that doesn't return rows
    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> StorageResult<usize>;

    /// Set busy timeout in milliseconds
    fn busy_timeout(&self, timeout_ms: u64) -> StorageResult<()>;
}

/// Prepared SQL statement (marker trait)
pub trait Statement {
    /// Execute the statement with parameters
    fn execute(&mut self, params: &[&dyn ToSql]) -> StorageResult<usize>;
}

/// Transaction wrapper
///
/// Transactions automatically rollback on drop unless committed.
pub struct Transaction<'conn> {
    inner: Option<RusqliteTransaction<'conn>>,
}

impl<'conn> Transaction<'conn> {
    /// Create a new transaction wrapper
    pub fn new(transaction: RusqliteTransaction<'conn>) -> Self {
        Self { inner: Some(transaction) }
    }

    /// Commit the transaction
    pub fn commit(mut self) -> StorageResult<()> {
        if let Some(tx) = self.inner.take() {
            tx.commit().map_err(StorageError::from)
        } else {
            Err(StorageError::Query("Transaction already consumed".to_string()))
        }
    }

    /// Rollback the transaction
    pub fn rollback(mut self) -> StorageResult<()> {
        if let Some(tx) = self.inner.take() {
            tx.rollback().map_err(StorageError::from)
        } else {
            Err(StorageError::Query("Transaction already consumed".to_string()))
        }
    }

    /// Execute a statement within the transaction
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> StorageResult<usize> {
        if let Some(ref tx) = self.inner {
            tx.execute(sql, params).map_err(StorageError::from)
        } else {
            Err(StorageError::Query("Transaction already consumed".to_string()))
        }
    }
}

impl<'conn> Drop for Transaction<'conn> {
    fn drop(&mut self) {
        if let Some(tx) = self.inner.take() {
            // Auto-rollback on drop
            let _ = tx.rollback();
        }
    }
}

/// Health status of the storage system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub healthy: bool,

    /// Number of active connections
    pub active_connections: usize,

    /// Number of idle connections
    pub idle_connections: usize,

    /// Maximum pool size
    pub max_connections: usize,

    /// Optional error message if unhealthy
    pub message: Option<String>,
}

impl HealthStatus {
    /// Create a healthy status
    pub fn healthy(active: usize, idle: usize, max: usize) -> Self {
        Self {
            healthy: true,
            active_connections: active,
            idle_connections: idle,
            max_connections: max,
            message: None,
        }
    }

    /// Create an unhealthy status
    pub fn unhealthy(message: String) -> Self {
        Self {
            healthy: false,
            active_connections: 0,
            idle_connections: 0,
            max_connections: 0,
            message: Some(message),
        }
    }
}

/// Connection pool metrics
#[derive(Debug, Clone, Default)]
pub struct PoolMetrics {
    /// Total connections acquired
    pub connections_acquired: u64,

    /// Total connection timeouts
    pub connections_timeout: u64,

    /// Total connection errors
    pub connections_error: u64,

    /// Average connection acquisition time (milliseconds)
    pub avg_acquisition_time_ms: u64,

    /// Total queries executed
    pub queries_executed: u64,

    /// Total query failures
    pub queries_failed: u64,
}
