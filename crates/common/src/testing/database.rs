//! SQLite test database helpers.
//!
//! Provides lightweight utilities for creating on-disk SQLite databases for
//! use in integration tests (primarily the event store). The helpers keep
//! database lifetimes tied to a temporary directory so clean-up happens
//! automatically when the test completes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CommonError;
use crate::storage::pool::{SqliteConn, SqlitePool, SqlitePoolConfig};

/// Result type for test database operations
pub type TestDbResult<T> = Result<T, CommonError>;

/// Manage the lifetime of a temporary SQLite database for tests.
///
/// The database file is created inside a temporary directory and removed
/// when the struct is dropped.
#[derive(Debug)]
pub struct SqliteTestDatabase {
    /// Temporary directory that owns the database file.
    /// Kept here to ensure RAII cleanup when the struct is dropped.
    #[allow(dead_code)]
    temp_dir: super::TempDir,
    db_path: PathBuf,
    pool: SqlitePool,
}

impl SqliteTestDatabase {
    /// Create a new on-disk SQLite database using the default pool config.
    pub fn new() -> TestDbResult<Self> {
        Self::with_pool_config(SqlitePoolConfig::default())
    }

    /// Create a new on-disk SQLite database with a custom pool config.
    pub fn with_pool_config(config: SqlitePoolConfig) -> TestDbResult<Self> {
        let temp_dir = super::TempDir::new("sqlite-test").map_err(|e| {
            CommonError::persistence_op(
                "create_temp_dir",
                format!("Failed to create temporary directory: {e}"),
            )
        })?;
        let db_path = temp_dir.path().join("insper-sync-test.db");

        let pool = SqlitePool::new(&db_path, config).map_err(|err| {
            CommonError::persistence_op("create_pool", format!("failed to create SQLite pool: {err}"))
        })?;

        Ok(Self { temp_dir, db_path, pool })
    }

    /// Acquire a pooled SQLite connection.
    pub fn connection(&self) -> TestDbResult<SqliteConn> {
        self.pool.get_sqlite_connection().map_err(|err| {
            CommonError::persistence_op("get_connection", format!("acquire connection: {err}"))
        })
    }

    /// Execute a SQL script (potentially multiple statements) against the
    /// database.
    pub fn run_script(&self, sql: &str) -> TestDbResult<()> {
        let conn = self.connection()?;
        conn.execute_batch(sql).map_err(|err| {
            CommonError::persistence_op(
                "execute_batch",
                format!("execute SQL script failed: {err}"),
            )
        })?;
        Ok(())
    }

    /// Apply all `.sql` files (sorted lexicographically) found in `dir`.
    ///
    /// Returns the number of applied migration files.
    pub fn run_migrations_from_dir(&self, dir: &Path) -> TestDbResult<usize> {
        if !dir.exists() {
            return Err(CommonError::not_found(format!("migrations directory: {}", dir.display())));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| {
                CommonError::persistence_op(
                    "read_migrations_dir",
                    format!("read migrations directory {}: {}", dir.display(), e),
                )
            })?
            .filter_map(|entry| match entry {
                Ok(e) => {
                    let path = e.path();
                    if path.extension().and_then(|ext| ext.to_str()) == Some("sql") {
                        Some(path)
                    } else {
                        None
                    }
                }
                Err(_) => None,
            })
            .collect();

        files.sort();

        for path in &files {
            let script = fs::read_to_string(path).map_err(|e| {
                CommonError::persistence_op(
                    "read_migration_file",
                    format!("read SQL migration {}: {}", path.display(), e),
                )
            })?;
            self.run_script(&script).map_err(|e| {
                CommonError::persistence_op(
                    "apply_migration",
                    format!("apply SQL migration {}: {}", path.display(), e),
                )
            })?;
        }

        Ok(files.len())
    }

    /// Return the path of the database file on disk.
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}
