//! Port interface for the Event Store (C8): a durable mirror of upstream
//! events, downstream events, their mapping, sync sessions, and per-user
//! sync configuration.
//!
//! All timestamps are stored timezone-aware; naive inputs are localised to
//! `America/Sao_Paulo` before persistence (implementations' responsibility).

use async_trait::async_trait;
use chrono::Duration;
use pulsearc_domain::{
    DownstreamEvent, EventMapping, SyncConfiguration, SyncResult, SyncSession, UpstreamEvent,
};
use uuid::Uuid;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert or update by (user, upstream_event_id).
    async fn upsert_upstream_event(&self, event: &UpstreamEvent) -> SyncResult<()>;

    /// Insert or update by (user, downstream_event_id).
    async fn upsert_downstream_event(&self, event: &DownstreamEvent) -> SyncResult<()>;

    async fn upsert_event_mapping(&self, mapping: &EventMapping) -> SyncResult<()>;

    async fn find_upstream_events_by_user(&self, user_id: Uuid) -> SyncResult<Vec<UpstreamEvent>>;

    async fn find_upstream_event_by_id(
        &self,
        user_id: Uuid,
        upstream_event_id: &str,
    ) -> SyncResult<Option<UpstreamEvent>>;

    async fn find_downstream_events_by_user(&self, user_id: Uuid) -> SyncResult<Vec<DownstreamEvent>>;

    async fn create_sync_session(&self, session: &SyncSession) -> SyncResult<()>;

    async fn update_sync_session(&self, session: &SyncSession) -> SyncResult<()>;

    async fn get_sync_session(&self, id: Uuid) -> SyncResult<Option<SyncSession>>;

    async fn get_sync_configuration(&self, user_id: Uuid) -> SyncResult<Option<SyncConfiguration>>;

    async fn upsert_sync_configuration(&self, config: &SyncConfiguration) -> SyncResult<()>;

    /// True iff a `SyncSession` for `user_id` has status=running and
    /// `started_at` within the last `within`. Backs the orchestrator's
    /// in-flight dedup guard (§4.6, §5) with a real query rather than an
    /// assumption.
    async fn has_recent_running_session(&self, user_id: Uuid, within: Duration) -> SyncResult<bool>;

    /// Deletes `SyncSession` rows older than `older_than_days`. Backs the
    /// fleet-level `cleanup_old_sync_sessions` job (§4.8). Returns the
    /// number of rows deleted.
    async fn delete_sync_sessions_older_than(&self, older_than_days: i64) -> SyncResult<u64>;
}
