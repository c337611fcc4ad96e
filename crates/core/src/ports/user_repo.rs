//! Port interface for the `users` table: capability flags, portal and
//! downstream credentials, and the last-sync watermark.
//!
//! Kept separate from [`super::store::EventStore`] — the event store mirrors
//! upstream/downstream events and sync bookkeeping, while this port owns the
//! per-user account row the orchestrator resolves before every sync.

use async_trait::async_trait;
use pulsearc_domain::{SyncResult, User};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, user_id: Uuid) -> SyncResult<Option<User>>;

    /// Users eligible for the fleet-level `sync_all_users` job: all four
    /// capability flags true and the user's `SyncConfiguration.sync_enabled`
    /// true (§10.5).
    async fn find_eligible_for_sync(&self) -> SyncResult<Vec<User>>;

    /// Persists a newly resolved downstream calendar id (§4.8 step 7).
    async fn update_downstream_calendar_id(&self, user_id: Uuid, calendar_id: &str) -> SyncResult<()>;

    /// Stamps `last_sync` after a sync session completes successfully.
    async fn update_last_sync(&self, user_id: Uuid, at: chrono::DateTime<chrono::Utc>) -> SyncResult<()>;

    /// Persists a freshly issued or refreshed OAuth token set (C6). A
    /// `None` refresh token leaves the previously stored one untouched —
    /// not every refresh response reissues one.
    async fn update_oauth_tokens(
        &self,
        user_id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> SyncResult<()>;

    /// Clears stored OAuth tokens (logout / revoked grant).
    async fn clear_oauth_tokens(&self, user_id: Uuid) -> SyncResult<()>;
}
