//! Ties one UpstreamEvent to one DownstreamEvent within a specific
//! SyncSession.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// Lifecycle state of an `EventMapping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum MappingStatus {
    Pending,
    Synced,
    Failed,
    Conflict,
    Deleted,
}

impl_domain_status_conversions!(MappingStatus {
    Pending => "pending",
    Synced => "synced",
    Failed => "failed",
    Conflict => "conflict",
    Deleted => "deleted",
});

/// Direction of the last applied mutation. Upstream-to-downstream only in
/// this release; the variant exists so a future bidirectional release does
/// not need a schema migration to add it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum SyncDirection {
    UpstreamToDownstream,
}

/// Uniqueness: (upstream_event, downstream_event). Created or refreshed on
/// each session that touches the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct EventMapping {
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub id: Uuid,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub sync_session_id: Uuid,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub upstream_event_id: Uuid,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub downstream_event_id: Uuid,

    pub status: MappingStatus,
    pub direction: SyncDirection,

    pub error_message: Option<String>,
    pub needs_manual_review: bool,

    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_round_trips_through_string() {
        for status in
            [MappingStatus::Pending, MappingStatus::Synced, MappingStatus::Failed, MappingStatus::Conflict, MappingStatus::Deleted]
        {
            let parsed = MappingStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&MappingStatus::Conflict).unwrap();
        assert_eq!(json, "\"conflict\"");
    }
}
