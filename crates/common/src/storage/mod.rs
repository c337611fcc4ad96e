//! Storage primitives for the local event store
//!
//! This module provides a plain SQLite connection pool (no at-rest
//! encryption - this service runs server-side, unlike the desktop agent)
//! plus the shared connection/metrics/error types.

pub mod error;
pub mod metrics;
pub mod pool;
pub mod types;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use metrics::StorageMetrics;
pub use pool::{SqliteConn, SqlitePool, SqlitePoolConfig, SqliteStatement};
pub use types::{Connection, ConnectionPool, HealthStatus, PoolMetrics, Statement, Transaction};
