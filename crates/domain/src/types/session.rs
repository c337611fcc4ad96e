//! A single sync run for a user over a date range, with a durable audit
//! trail of what happened.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// Terminal/non-terminal state of a `SyncSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
    Partial,
}

impl_domain_status_conversions!(SessionStatus {
    Running => "running",
    Completed => "completed",
    Failed => "failed",
    Partial => "partial",
});

impl SessionStatus {
    /// True for the three terminal states. `completed_at` must be set iff
    /// this is true.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One orchestrator run for a user over `[start_date, end_date]`.
///
/// Invariant: exactly one terminal status is set, and `completed_at` is
/// non-null iff `status` is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct SyncSession {
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub id: Uuid,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub user_id: Uuid,

    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub start_date: NaiveDate,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub end_date: NaiveDate,

    pub status: SessionStatus,

    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub started_at: DateTime<Utc>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string", optional))]
    pub completed_at: Option<DateTime<Utc>>,

    pub upstream_found: u32,
    pub downstream_found: u32,
    pub created: u32,
    pub updated: u32,
    pub deleted: u32,
    pub failed: u32,

    pub error_message: Option<String>,
    pub error_details: Option<serde_json::Value>,
}

impl SyncSession {
    /// Start a new running session over the given range.
    #[must_use]
    pub fn new(user_id: Uuid, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            start_date,
            end_date,
            status: SessionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            upstream_found: 0,
            downstream_found: 0,
            created: 0,
            updated: 0,
            deleted: 0,
            failed: 0,
            error_message: None,
            error_details: None,
        }
    }

    /// Transition to a terminal status, stamping `completed_at`.
    pub fn finish(&mut self, status: SessionStatus, error_message: Option<String>) {
        debug_assert!(status.is_terminal(), "finish() requires a terminal status");
        self.status = status;
        self.completed_at = Some(Utc::now());
        self.error_message = error_message;
    }

    /// Whichever terminal status reflects the accumulated counters: `failed`
    /// (complete success) is represented by `Completed`; any per-event
    /// failure recorded alongside successful completion still yields
    /// `Completed` with `failed > 0` — §7 explicitly allows this. Callers
    /// that hit an unhandled exception in orchestrator steps 6-10 should
    /// call `finish` with `Failed` directly instead of this helper.
    #[must_use]
    pub fn completion_status(&self) -> SessionStatus {
        SessionStatus::Completed
    }
}
