//! Domain error taxonomy
//!
//! A single `thiserror`-derived enum covering every failure mode the core
//! sync engine surfaces. Infrastructure-layer errors (reqwest, rusqlite,
//! serde_json, rsa, base64) convert into this enum via `From` impls at the
//! crate boundary so callers only ever match on `SyncError`.
//!
//! Per-event and per-month failures (§7: `PartialScrapeWarning`, per-event
//! create/update/delete failures) are intentionally NOT modeled as
//! `SyncError` variants — they are captured as `String` messages attached to
//! session counters and event mappings, and never propagate past C5/C9.
//! Only orchestrator-level failures use this `Result`-propagating path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain-wide error type for the sync engine.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncError {
    /// Network or HTTP transport failure against the upstream portal or the
    /// downstream calendar API.
    #[error("connection error: {0}")]
    Connection(String),

    /// Portal login rejected, profile missing, or OAuth refresh refused.
    #[error("auth error: {0}")]
    Auth(String),

    /// Public-key fetch or RSA password encryption failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Event Store read or write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration missing or malformed.
    #[error("config error: {0}")]
    Config(String),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller-supplied input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Anything else — unexpected invariant violations, bugs.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// True when the orchestrator should consider retrying the sync.
    ///
    /// Auth failures are retryable unless the portal rejected the login
    /// outright (HTTP 401), per §7's heuristic — callers that know they are
    /// looking at a login rejection should not route through this generic
    /// check and should instead record the session as non-retryable
    /// directly.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Crypto(_) | Self::Auth(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("json error: {err}"))
    }
}

/// Result type alias for sync engine operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
