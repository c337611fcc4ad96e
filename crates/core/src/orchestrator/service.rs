//! The per-user sync job (C10): invokes C3→C5, C6→C7, then C9, recording a
//! `SyncSession` and enforcing the retry and concurrency rules in §4.8/§5.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pulsearc_common::resilience::retry::{RetryConfig, RetryDecision, RetryExecutor, RetryPolicy};
use pulsearc_domain::{
    constants, SessionStatus, SyncConfiguration, SyncError, SyncResult, SyncSession,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::range::default_range;
use crate::ports::{CalendarScraperFactory, DownstreamCalendarClient, EventStore, OAuthTokenManager, UserRepository};
use crate::reconcile::{ReconcileStats, Reconciler};

/// Result of a `sync_user_calendar` call. A skip is a deliberate no-op, not
/// an error — callers distinguish it from `Completed`/`Failed` explicitly
/// rather than inferring it from an `Err`.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Skipped { reason: String },
    Completed { session_id: Uuid, stats: ReconcileStats },
    Failed { session_id: Option<Uuid>, error: String },
}

pub struct SyncOrchestrator {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn EventStore>,
    scrapers: Arc<dyn CalendarScraperFactory>,
    oauth: Arc<dyn OAuthTokenManager>,
    downstream: Arc<dyn DownstreamCalendarClient>,
    reconciler: Reconciler,
}

struct RetrySyncErrors;

impl RetryPolicy<SyncError> for RetrySyncErrors {
    fn should_retry(&self, error: &SyncError, _attempt: u32) -> RetryDecision {
        if error.is_retryable() {
            RetryDecision::RetryAfter(StdDuration::from_secs(constants::SYNC_RETRY_DELAY_SECS))
        } else {
            RetryDecision::Stop
        }
    }
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn EventStore>,
        scrapers: Arc<dyn CalendarScraperFactory>,
        oauth: Arc<dyn OAuthTokenManager>,
        downstream: Arc<dyn DownstreamCalendarClient>,
        reconciler: Reconciler,
    ) -> Self {
        Self { users, store, scrapers, oauth, downstream, reconciler }
    }

    /// Entry point: `syncUserCalendar(user_id, start?, end?)`. Retries up to
    /// `SYNC_MAX_RETRIES` times with a fixed `SYNC_RETRY_DELAY_SECS` delay
    /// on retryable failures; after exhaustion returns `Failed` rather than
    /// propagating, so a job queue always records a terminal result.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn sync_user_calendar(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> SyncOutcome {
        let retry_config = RetryConfig::builder()
            .max_attempts(constants::SYNC_MAX_RETRIES)
            .fixed_backoff(StdDuration::from_secs(constants::SYNC_RETRY_DELAY_SECS))
            .unlimited_time()
            .build()
            .unwrap_or_default();
        let executor = RetryExecutor::new(retry_config, RetrySyncErrors);

        match executor.execute(|| self.attempt_sync(user_id, start, end)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(user_id = %user_id, error = ?err, "sync exhausted retries");
                SyncOutcome::Failed { session_id: None, error: err.to_string() }
            }
        }
    }

    async fn attempt_sync(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> SyncResult<SyncOutcome> {
        // Step 1: resolve user, check capability flags.
        let Some(user) = self.users.get_by_id(user_id).await? else {
            return Ok(SyncOutcome::Skipped { reason: "user not found".to_string() });
        };
        if !user.is_sync_eligible() {
            return Ok(SyncOutcome::Skipped { reason: "capabilities incomplete".to_string() });
        }

        // Step 2: in-flight dedup guard.
        let window = Duration::minutes(constants::RECENT_SESSION_WINDOW_MINUTES);
        if self.store.has_recent_running_session(user_id, window).await? {
            return Ok(SyncOutcome::Skipped { reason: "sync already in flight".to_string() });
        }

        // Step 3: default range.
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            _ => default_range(Utc::now().date_naive()),
        };

        // Step 4: load or create configuration.
        let sync_config = match self.store.get_sync_configuration(user_id).await? {
            Some(config) => config,
            None => {
                let config = SyncConfiguration::default_for(user_id);
                self.store.upsert_sync_configuration(&config).await?;
                config
            }
        };
        if !sync_config.sync_enabled {
            return Ok(SyncOutcome::Skipped { reason: "sync disabled for user".to_string() });
        }

        // Step 5: open the session.
        let mut session = SyncSession::new(user_id, start, end);
        self.store.create_sync_session(&session).await?;
        info!(session_id = %session.id, user_id = %user_id, "sync session opened");

        match self.run_session(&user, &sync_config, &mut session, start, end).await {
            Ok(stats) => {
                session.created = stats.created;
                session.updated = stats.updated;
                session.deleted = stats.deleted;
                session.failed = stats.failed;
                session.finish(SessionStatus::Completed, None);
                self.store.update_sync_session(&session).await?;
                self.users.update_last_sync(user_id, Utc::now()).await?;
                info!(session_id = %session.id, ?stats, "sync session completed");
                Ok(SyncOutcome::Completed { session_id: session.id, stats })
            }
            Err(err) => {
                session.finish(SessionStatus::Failed, Some(err.to_string()));
                // A session-update failure here must not mask the original
                // error driving the retry/terminal-failure decision.
                if let Err(store_err) = self.store.update_sync_session(&session).await {
                    warn!(session_id = %session.id, error = %store_err, "failed to persist failed session status");
                }
                Err(err)
            }
        }
    }

    /// Steps 6-9: scrape, resolve the downstream calendar, list markered
    /// events, and invoke the reconciler.
    async fn run_session(
        &self,
        user: &pulsearc_domain::User,
        sync_config: &SyncConfiguration,
        session: &mut SyncSession,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SyncResult<ReconcileStats> {
        // Step 6: C3 -> C5.
        let scraper = self.scrapers.scraper_for(user).await?;
        let mut upstream_events = scraper.get_events_for_range(start, end).await?;
        session.upstream_found = upstream_events.len() as u32;
        for event in &mut upstream_events {
            event.recompute_hash();
            if let Err(err) = self.store.upsert_upstream_event(event).await {
                warn!(upstream_event_id = %event.upstream_event_id, error = %err, "failed to persist scraped event");
            }
        }

        // Step 7: C6 -> C7's findOrCreateSyncCalendar.
        let access_token = self.oauth.get_valid_access_token(user).await?;
        let calendar_id = self
            .downstream
            .find_or_create_sync_calendar(&access_token, &sync_config.google_calendar_name)
            .await?;
        if user.downstream_calendar_id.as_deref() != Some(calendar_id.as_str()) {
            self.users.update_downstream_calendar_id(user.id, &calendar_id).await?;
        }

        // Step 8: list events, filtered to markered ones.
        let tz_start = to_utc_midnight(start);
        let tz_end = to_utc_midnight(end);
        let raw_events = self
            .downstream
            .list_events(&access_token, &calendar_id, tz_start, tz_end, constants::DOWNSTREAM_LIST_MAX_RESULTS)
            .await?;
        let downstream_events: Vec<_> = raw_events
            .iter()
            .map(|raw| crate::reconcile::convert::downstream_event_from_listed_raw(user.id, &calendar_id, raw))
            .filter(|event| event.carries_sync_marker())
            .collect();
        session.downstream_found = downstream_events.len() as u32;

        // Step 9: reconcile.
        self.reconciler
            .reconcile(user.id, session.id, &access_token, sync_config, &calendar_id, upstream_events, downstream_events)
            .await
    }

    /// `syncAllUsers()` (§10.5): enqueue-equivalent for every eligible user.
    /// Since this crate has no job-queue dependency of its own, "enqueue" is
    /// represented as a direct sequential call; a queue-backed caller can
    /// instead iterate `find_eligible_for_sync` itself and dispatch.
    #[instrument(skip(self))]
    pub async fn sync_all_users(&self) -> SyncResult<Vec<(Uuid, SyncOutcome)>> {
        let users = self.users.find_eligible_for_sync().await?;
        let mut outcomes = Vec::with_capacity(users.len());
        for user in users {
            let outcome = self.sync_user_calendar(user.id, None, None).await;
            outcomes.push((user.id, outcome));
        }
        Ok(outcomes)
    }

    /// `cleanupOldSyncSessions()` (§10.5).
    pub async fn cleanup_old_sync_sessions(&self) -> SyncResult<u64> {
        self.store.delete_sync_sessions_older_than(constants::SESSION_RETENTION_DAYS).await
    }
}

fn to_utc_midnight(date: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pulsearc_common::auth::TokenSet;
    use pulsearc_domain::{DownstreamEvent, EventMapping, UpstreamEvent, User};
    use serde_json::Value;

    use super::*;
    use crate::ports::{CalendarListEntry, CalendarScraper, DownstreamEventPayload};

    fn sample_user(id: Uuid, eligible: bool) -> User {
        User {
            id,
            email: "student@insper.edu.br".to_string(),
            portal_username: Some("12345".to_string()),
            portal_password_ciphertext: Some("ciphertext".to_string()),
            oauth_access_token: Some("token".to_string()),
            oauth_refresh_token: Some("refresh".to_string()),
            oauth_expires_at: Some(Utc::now() + Duration::hours(1)),
            downstream_calendar_id: None,
            email_verified: eligible,
            portal_credentials_configured: eligible,
            downstream_connected: eligible,
            active: eligible,
            last_sync: None,
        }
    }

    #[derive(Default)]
    struct FakeUsers {
        user: Mutex<Option<User>>,
    }

    #[async_trait]
    impl UserRepository for FakeUsers {
        async fn get_by_id(&self, _user_id: Uuid) -> SyncResult<Option<User>> {
            Ok(self.user.lock().unwrap().clone())
        }

        async fn find_eligible_for_sync(&self) -> SyncResult<Vec<User>> {
            Ok(self.user.lock().unwrap().iter().cloned().collect())
        }

        async fn update_downstream_calendar_id(&self, _user_id: Uuid, calendar_id: &str) -> SyncResult<()> {
            if let Some(user) = self.user.lock().unwrap().as_mut() {
                user.downstream_calendar_id = Some(calendar_id.to_string());
            }
            Ok(())
        }

        async fn update_last_sync(&self, _user_id: Uuid, at: chrono::DateTime<Utc>) -> SyncResult<()> {
            if let Some(user) = self.user.lock().unwrap().as_mut() {
                user.last_sync = Some(at);
            }
            Ok(())
        }

        async fn update_oauth_tokens(
            &self,
            _user_id: Uuid,
            access_token: &str,
            refresh_token: Option<&str>,
            expires_at: chrono::DateTime<Utc>,
        ) -> SyncResult<()> {
            if let Some(user) = self.user.lock().unwrap().as_mut() {
                user.oauth_access_token = Some(access_token.to_string());
                if let Some(refresh_token) = refresh_token {
                    user.oauth_refresh_token = Some(refresh_token.to_string());
                }
                user.oauth_expires_at = Some(expires_at);
            }
            Ok(())
        }

        async fn clear_oauth_tokens(&self, _user_id: Uuid) -> SyncResult<()> {
            if let Some(user) = self.user.lock().unwrap().as_mut() {
                user.oauth_access_token = None;
                user.oauth_refresh_token = None;
                user.oauth_expires_at = None;
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        recent_running: Mutex<bool>,
        sessions: Mutex<Vec<SyncSession>>,
    }

    #[async_trait]
    impl EventStore for FakeStore {
        async fn upsert_upstream_event(&self, _event: &UpstreamEvent) -> SyncResult<()> {
            Ok(())
        }

        async fn upsert_downstream_event(&self, _event: &DownstreamEvent) -> SyncResult<()> {
            Ok(())
        }

        async fn upsert_event_mapping(&self, _mapping: &EventMapping) -> SyncResult<()> {
            Ok(())
        }

        async fn find_upstream_events_by_user(&self, _user_id: Uuid) -> SyncResult<Vec<UpstreamEvent>> {
            Ok(Vec::new())
        }

        async fn find_upstream_event_by_id(&self, _user_id: Uuid, _upstream_event_id: &str) -> SyncResult<Option<UpstreamEvent>> {
            Ok(None)
        }

        async fn find_downstream_events_by_user(&self, _user_id: Uuid) -> SyncResult<Vec<DownstreamEvent>> {
            Ok(Vec::new())
        }

        async fn create_sync_session(&self, session: &SyncSession) -> SyncResult<()> {
            self.sessions.lock().unwrap().push(session.clone());
            Ok(())
        }

        async fn update_sync_session(&self, session: &SyncSession) -> SyncResult<()> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(existing) = sessions.iter_mut().find(|s| s.id == session.id) {
                *existing = session.clone();
            }
            Ok(())
        }

        async fn get_sync_session(&self, id: Uuid) -> SyncResult<Option<SyncSession>> {
            Ok(self.sessions.lock().unwrap().iter().find(|s| s.id == id).cloned())
        }

        async fn get_sync_configuration(&self, _user_id: Uuid) -> SyncResult<Option<SyncConfiguration>> {
            Ok(None)
        }

        async fn upsert_sync_configuration(&self, _config: &SyncConfiguration) -> SyncResult<()> {
            Ok(())
        }

        async fn has_recent_running_session(&self, _user_id: Uuid, _within: Duration) -> SyncResult<bool> {
            Ok(*self.recent_running.lock().unwrap())
        }

        async fn delete_sync_sessions_older_than(&self, _older_than_days: i64) -> SyncResult<u64> {
            Ok(0)
        }
    }

    struct FakeScraperFactory {
        events: Vec<UpstreamEvent>,
    }

    struct FakeScraper {
        events: Vec<UpstreamEvent>,
    }

    #[async_trait]
    impl CalendarScraper for FakeScraper {
        async fn get_events_for_range(&self, _start: NaiveDate, _end: NaiveDate) -> SyncResult<Vec<UpstreamEvent>> {
            Ok(self.events.clone())
        }
    }

    #[async_trait]
    impl CalendarScraperFactory for FakeScraperFactory {
        async fn scraper_for(&self, _user: &User) -> SyncResult<Arc<dyn CalendarScraper>> {
            Ok(Arc::new(FakeScraper { events: self.events.clone() }))
        }
    }

    struct FakeOAuth;

    #[async_trait]
    impl OAuthTokenManager for FakeOAuth {
        async fn get_valid_access_token(&self, _user: &User) -> SyncResult<String> {
            Ok("access-token".to_string())
        }

        async fn get_authorization_url(&self) -> SyncResult<(String, String)> {
            Ok(("https://example.test/consent".to_string(), "state".to_string()))
        }

        async fn exchange_code(&self, _code: &str, _state: &str) -> SyncResult<TokenSet> {
            unimplemented!("not exercised by orchestrator tests")
        }
    }

    #[derive(Default)]
    struct FakeDownstream;

    #[async_trait]
    impl DownstreamCalendarClient for FakeDownstream {
        async fn find_or_create_sync_calendar(&self, _access_token: &str, _display_name: &str) -> SyncResult<String> {
            Ok("cal-1".to_string())
        }

        async fn list_calendars(&self, _access_token: &str) -> SyncResult<Vec<CalendarListEntry>> {
            Ok(Vec::new())
        }

        async fn list_events(
            &self,
            _access_token: &str,
            _calendar_id: &str,
            _time_min: chrono::DateTime<Utc>,
            _time_max: chrono::DateTime<Utc>,
            _max_results: u32,
        ) -> SyncResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn create_event(&self, _access_token: &str, _calendar_id: &str, body: &DownstreamEventPayload) -> SyncResult<Value> {
            Ok(serde_json::json!({
                "id": format!("gcal-{}", body.extended_properties.insper_event_id),
                "summary": body.title,
                "start": {"dateTime": body.start.to_rfc3339()},
                "end": {"dateTime": body.end.to_rfc3339()},
                "extendedProperties": {"private": {
                    "insper_event_id": body.extended_properties.insper_event_id,
                    "sync_source": body.extended_properties.sync_source,
                }}
            }))
        }

        async fn update_event(
            &self,
            _access_token: &str,
            _calendar_id: &str,
            _event_id: &str,
            _body: &DownstreamEventPayload,
        ) -> SyncResult<Value> {
            unimplemented!("not exercised by orchestrator tests")
        }

        async fn delete_event(&self, _access_token: &str, _calendar_id: &str, _event_id: &str) -> SyncResult<()> {
            Ok(())
        }
    }

    fn sample_upstream(id: &str) -> UpstreamEvent {
        UpstreamEvent {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            upstream_event_id: id.to_string(),
            title: "Math".to_string(),
            description: None,
            start_datetime: Utc::now(),
            end_datetime: Utc::now() + Duration::hours(1),
            all_day: false,
            discipline_code: Some("MATH101".to_string()),
            instructor: Some("Alice".to_string()),
            class_group: None,
            location: None,
            event_kind: Some("aula".to_string()),
            source_timezone: "America/Sao_Paulo".to_string(),
            raw_payload: Value::Null,
            content_hash: String::new(),
            is_active: true,
            last_seen_at: Utc::now(),
        }
    }

    fn orchestrator(user: Option<User>, events: Vec<UpstreamEvent>) -> (SyncOrchestrator, Arc<FakeStore>, Arc<FakeUsers>) {
        let users = Arc::new(FakeUsers { user: Mutex::new(user) });
        let store = Arc::new(FakeStore::default());
        let downstream: Arc<dyn DownstreamCalendarClient> = Arc::new(FakeDownstream);
        let reconciler = Reconciler::new(store.clone(), downstream.clone(), "https://sync.example.test".to_string());
        let orchestrator = SyncOrchestrator::new(
            users.clone(),
            store.clone(),
            Arc::new(FakeScraperFactory { events }),
            Arc::new(FakeOAuth),
            downstream,
            reconciler,
        );
        (orchestrator, store, users)
    }

    #[tokio::test]
    async fn skips_when_capabilities_incomplete() {
        let user_id = Uuid::new_v4();
        let (orchestrator, _store, _users) = orchestrator(Some(sample_user(user_id, false)), Vec::new());

        let outcome = orchestrator.sync_user_calendar(user_id, None, None).await;
        assert!(matches!(outcome, SyncOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn skips_when_a_sync_is_already_running() {
        let user_id = Uuid::new_v4();
        let (orchestrator, store, _users) = orchestrator(Some(sample_user(user_id, true)), Vec::new());
        *store.recent_running.lock().unwrap() = true;

        let outcome = orchestrator.sync_user_calendar(user_id, None, None).await;
        assert!(matches!(outcome, SyncOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn completes_and_stamps_last_sync_on_success() {
        let user_id = Uuid::new_v4();
        let events = vec![sample_upstream("ev-A")];
        let (orchestrator, _store, users) = orchestrator(Some(sample_user(user_id, true)), events);

        let today = Utc::now().date_naive();
        let outcome = orchestrator.sync_user_calendar(user_id, Some(today), Some(today)).await;

        match outcome {
            SyncOutcome::Completed { stats, .. } => {
                assert_eq!(stats.created, 1);
                assert_eq!(stats.failed, 0);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert!(users.user.lock().unwrap().as_ref().unwrap().last_sync.is_some());
    }
}
