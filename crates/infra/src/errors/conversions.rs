//! Conversions from external infrastructure errors into [`SyncError`].

use pulsearc_common::storage::error::StorageError;
use pulsearc_domain::SyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        InfraError(value)
    }
}

trait IntoSyncError {
    fn into_sync_error(self) -> SyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error -> SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for SqlError {
    fn into_sync_error(self) -> SyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        fn looks_like_wrong_key(message: &str) -> bool {
            let lower = message.to_ascii_lowercase();
            lower.contains("not a database") || lower.contains("encrypted")
        }

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => SyncError::Storage("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        SyncError::Storage("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        SyncError::Storage("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        SyncError::Storage("foreign key constraint violation".into())
                    }
                    (_, _) if looks_like_wrong_key(&message) => {
                        SyncError::Crypto("database key rejected or database not encrypted".into())
                    }
                    _ => SyncError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => SyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SyncError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SyncError::Storage(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => SyncError::Storage("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                SyncError::Storage(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => {
                SyncError::Storage(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => SyncError::Storage("invalid SQL query".into()),
            other => SyncError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_sync_error())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error -> SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for HttpError {
    fn into_sync_error(self) -> SyncError {
        if self.is_timeout() {
            return SyncError::Connection("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return SyncError::Connection("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SyncError::Auth(message),
                404 => SyncError::NotFound(message),
                429 => SyncError::Connection(message),
                400..=499 => SyncError::InvalidInput(message),
                500..=599 => SyncError::Connection(message),
                _ => SyncError::Connection(message),
            };
        }

        SyncError::Connection(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sync_error())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError -> SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for StorageError {
    fn into_sync_error(self) -> SyncError {
        match self {
            StorageError::Connection(msg) => SyncError::Storage(format!("connection error: {msg}")),
            StorageError::Query(msg) => SyncError::Storage(format!("query error: {msg}")),
            StorageError::DatabaseError(msg) => SyncError::Storage(format!("database error: {msg}")),
            StorageError::Encryption(msg) => SyncError::Crypto(format!("encryption error: {msg}")),
            StorageError::Migration(msg) => SyncError::Storage(format!("migration error: {msg}")),
            StorageError::Keychain(msg) => SyncError::Crypto(format!("keychain error: {msg}")),
            StorageError::WrongKeyOrNotEncrypted => {
                SyncError::Crypto("wrong encryption key or database not encrypted".into())
            }
            StorageError::PoolExhausted => SyncError::Storage("connection pool exhausted".into()),
            StorageError::Timeout(seconds) => {
                SyncError::Storage(format!("database timeout after {seconds}s"))
            }
            StorageError::InvalidConfig(msg) => SyncError::Config(format!("invalid config: {msg}")),
            StorageError::SchemaVersionMismatch { expected, found } => SyncError::Storage(format!(
                "schema version mismatch (expected {expected}, found {found})"
            )),
            StorageError::Common(common_err) => SyncError::Storage(common_err.to_string()),
            StorageError::Io(io_err) => SyncError::Storage(format!("IO error: {io_err}")),
            StorageError::Rusqlite(sql_err) => sql_err.into_sync_error(),
            StorageError::R2d2(r2d2_err) => {
                SyncError::Storage(format!("connection pool error: {r2d2_err}"))
            }
            StorageError::SerdeJson(json_err) => SyncError::Storage(format!("JSON error: {json_err}")),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_sync_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
