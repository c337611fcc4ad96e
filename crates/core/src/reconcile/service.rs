//! The diff-and-apply engine (C9).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use pulsearc_domain::{
    DownstreamEvent, EventMapping, MappingStatus, SyncConfiguration, SyncDirection, SyncResult,
    UpstreamEvent,
};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::convert::downstream_event_from_raw;
use super::format::{self, strip_timestamp_line};
use crate::ports::{DownstreamCalendarClient, EventStore};

/// Per-session counters the orchestrator persists onto the `SyncSession`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: u32,
    pub updated: u32,
    pub deleted: u32,
    pub failed: u32,
}

pub struct Reconciler {
    store: Arc<dyn EventStore>,
    downstream: Arc<dyn DownstreamCalendarClient>,
    source_url: String,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, downstream: Arc<dyn DownstreamCalendarClient>, source_url: String) -> Self {
        Self { store, downstream, source_url }
    }

    /// Runs the full diff-and-apply algorithm (§4.7) and returns the
    /// resulting counters. Per-event failures are absorbed into `failed`;
    /// this call only returns `Err` for a failure that isn't scoped to a
    /// single event (there currently is none — retained for future steps
    /// that may add one, e.g. a store-wide transaction failure).
    #[instrument(skip(self, upstream_events, downstream_events), fields(user_id = %user_id, session_id = %sync_session_id))]
    #[allow(clippy::too_many_arguments)]
    pub async fn reconcile(
        &self,
        user_id: Uuid,
        sync_session_id: Uuid,
        access_token: &str,
        sync_config: &SyncConfiguration,
        downstream_calendar_id: &str,
        upstream_events: Vec<UpstreamEvent>,
        downstream_events: Vec<DownstreamEvent>,
    ) -> SyncResult<ReconcileStats> {
        let now = Utc::now();
        let mut stats = ReconcileStats::default();

        // Step 1: index owned downstream events by their upstream marker id.
        let mut index: HashMap<String, DownstreamEvent> = HashMap::new();
        for downstream in downstream_events {
            if !downstream.carries_sync_marker() {
                continue;
            }
            if let Some(marker) = downstream.upstream_marker_id() {
                index.insert(marker.to_string(), downstream);
            }
        }

        // Step 2: exclusion-list filter.
        let kept: Vec<UpstreamEvent> = upstream_events
            .into_iter()
            .filter(|e| {
                sync_config.passes_exclusion_filter(e.event_kind.as_deref(), e.discipline_code.as_deref())
            })
            .collect();

        let mut kept_ids: HashSet<String> = HashSet::with_capacity(kept.len());

        // Step 3: per-event create/update-if-changed.
        for upstream in &kept {
            kept_ids.insert(upstream.upstream_event_id.clone());

            match index.get(&upstream.upstream_event_id) {
                None => {
                    self.apply_create(
                        user_id,
                        sync_session_id,
                        access_token,
                        sync_config,
                        downstream_calendar_id,
                        upstream,
                        now,
                        &mut stats,
                    )
                    .await;
                }
                Some(existing) => {
                    self.apply_update_if_changed(
                        user_id,
                        sync_session_id,
                        access_token,
                        sync_config,
                        downstream_calendar_id,
                        upstream,
                        existing,
                        now,
                        &mut stats,
                    )
                    .await;
                }
            }
        }

        // Step 4: orphan sweep. Must not start before every per-event apply
        // above has finished.
        for (marker_id, downstream) in &index {
            if kept_ids.contains(marker_id) {
                continue;
            }
            self.sweep_orphan(access_token, downstream_calendar_id, downstream, &mut stats).await;
        }

        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_create(
        &self,
        user_id: Uuid,
        sync_session_id: Uuid,
        access_token: &str,
        sync_config: &SyncConfiguration,
        downstream_calendar_id: &str,
        upstream: &UpstreamEvent,
        now: chrono::DateTime<Utc>,
        stats: &mut ReconcileStats,
    ) {
        let payload = format::build_payload(upstream, sync_config, now, true, &self.source_url);

        let created = self
            .downstream
            .create_event(access_token, downstream_calendar_id, &payload)
            .await;

        match created {
            Ok(raw) => {
                let mut downstream_event = downstream_event_from_raw(
                    user_id,
                    downstream_calendar_id,
                    &raw,
                    &upstream.upstream_event_id,
                );
                downstream_event.recompute_hash();

                if let Err(err) = self.store.upsert_downstream_event(&downstream_event).await {
                    warn!(error = %err, upstream_event_id = %upstream.upstream_event_id, "failed to persist created downstream event");
                    stats.failed += 1;
                    return;
                }

                let mapping = new_mapping(
                    sync_session_id,
                    upstream.id,
                    downstream_event.id,
                    MappingStatus::Synced,
                    None,
                );
                if let Err(err) = self.store.upsert_event_mapping(&mapping).await {
                    warn!(error = %err, upstream_event_id = %upstream.upstream_event_id, "failed to persist event mapping");
                }

                stats.created += 1;
                debug!(upstream_event_id = %upstream.upstream_event_id, "created downstream event");
            }
            Err(err) => {
                warn!(error = %err, upstream_event_id = %upstream.upstream_event_id, "create_event failed");
                stats.failed += 1;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_update_if_changed(
        &self,
        _user_id: Uuid,
        sync_session_id: Uuid,
        access_token: &str,
        sync_config: &SyncConfiguration,
        downstream_calendar_id: &str,
        upstream: &UpstreamEvent,
        existing: &DownstreamEvent,
        now: chrono::DateTime<Utc>,
        stats: &mut ReconcileStats,
    ) {
        let desired = format::desired_fields(upstream, sync_config);
        let stored_description = existing.description.as_deref().map(strip_timestamp_line).unwrap_or("");

        let changed = existing.title != desired.title
            || stored_description != desired.description_body
            || existing.start_datetime != desired.start
            || existing.end_datetime != desired.end;

        if !changed {
            return;
        }

        let payload = format::build_payload(upstream, sync_config, now, false, &self.source_url);

        let updated = self
            .downstream
            .update_event(access_token, downstream_calendar_id, &existing.downstream_event_id, &payload)
            .await;

        match updated {
            Ok(raw) => {
                let mut downstream_event = downstream_event_from_raw(
                    existing.user_id,
                    downstream_calendar_id,
                    &raw,
                    &upstream.upstream_event_id,
                );
                downstream_event.id = existing.id;
                downstream_event.recompute_hash();

                if let Err(err) = self.store.upsert_downstream_event(&downstream_event).await {
                    warn!(error = %err, upstream_event_id = %upstream.upstream_event_id, "failed to persist updated downstream event");
                    stats.failed += 1;
                    return;
                }

                let mapping = new_mapping(
                    sync_session_id,
                    upstream.id,
                    downstream_event.id,
                    MappingStatus::Synced,
                    None,
                );
                if let Err(err) = self.store.upsert_event_mapping(&mapping).await {
                    warn!(error = %err, upstream_event_id = %upstream.upstream_event_id, "failed to persist event mapping");
                }

                stats.updated += 1;
                debug!(upstream_event_id = %upstream.upstream_event_id, "updated downstream event");
            }
            Err(err) => {
                warn!(error = %err, upstream_event_id = %upstream.upstream_event_id, "update_event failed");
                stats.failed += 1;
            }
        }
    }

    async fn sweep_orphan(
        &self,
        access_token: &str,
        downstream_calendar_id: &str,
        downstream: &DownstreamEvent,
        stats: &mut ReconcileStats,
    ) {
        match self.downstream.delete_event(access_token, downstream_calendar_id, &downstream.downstream_event_id).await {
            Ok(()) => {
                let mut deactivated = downstream.clone();
                deactivated.is_active = false;
                if let Err(err) = self.store.upsert_downstream_event(&deactivated).await {
                    warn!(error = %err, downstream_event_id = %downstream.downstream_event_id, "failed to persist orphan deactivation");
                }
                stats.deleted += 1;
                debug!(downstream_event_id = %downstream.downstream_event_id, "swept orphaned downstream event");
            }
            Err(err) => {
                // Orphan-sweep failures are logged only; they never count
                // against the session's failure tally (§4.7 step 4).
                warn!(error = %err, downstream_event_id = %downstream.downstream_event_id, "orphan sweep delete_event failed");
            }
        }
    }
}

fn new_mapping(
    sync_session_id: Uuid,
    upstream_event_id: Uuid,
    downstream_event_id: Uuid,
    status: MappingStatus,
    error_message: Option<String>,
) -> EventMapping {
    let now = Utc::now();
    EventMapping {
        id: Uuid::new_v4(),
        sync_session_id,
        upstream_event_id,
        downstream_event_id,
        status,
        direction: SyncDirection::UpstreamToDownstream,
        error_message,
        needs_manual_review: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::ports::{CalendarListEntry, DownstreamEventPayload};

    #[derive(Default)]
    struct FakeStore {
        downstream_events: Mutex<Vec<DownstreamEvent>>,
        mappings: Mutex<Vec<EventMapping>>,
    }

    #[async_trait]
    impl EventStore for FakeStore {
        async fn upsert_upstream_event(&self, _event: &UpstreamEvent) -> SyncResult<()> {
            Ok(())
        }

        async fn upsert_downstream_event(&self, event: &DownstreamEvent) -> SyncResult<()> {
            self.downstream_events.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn upsert_event_mapping(&self, mapping: &EventMapping) -> SyncResult<()> {
            self.mappings.lock().unwrap().push(mapping.clone());
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

        async fn create_sync_session(&self, _session: &pulsearc_domain::SyncSession) -> SyncResult<()> {
            Ok(())
        }

        async fn update_sync_session(&self, _session: &pulsearc_domain::SyncSession) -> SyncResult<()> {
            Ok(())
        }

        async fn get_sync_session(&self, _id: Uuid) -> SyncResult<Option<pulsearc_domain::SyncSession>> {
            Ok(None)
        }

        async fn get_sync_configuration(&self, _user_id: Uuid) -> SyncResult<Option<SyncConfiguration>> {
            Ok(None)
        }

        async fn upsert_sync_configuration(&self, _config: &SyncConfiguration) -> SyncResult<()> {
            Ok(())
        }

        async fn has_recent_running_session(&self, _user_id: Uuid, _within: chrono::Duration) -> SyncResult<bool> {
            Ok(false)
        }

        async fn delete_sync_sessions_older_than(&self, _older_than_days: i64) -> SyncResult<u64> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct FakeDownstream {
        create_calls: Mutex<u32>,
        update_calls: Mutex<u32>,
        delete_calls: Mutex<u32>,
        fail_create_for: Mutex<Option<String>>,
    }

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
            *self.create_calls.lock().unwrap() += 1;
            if let Some(blocked) = self.fail_create_for.lock().unwrap().as_ref() {
                if body.extended_properties.insper_event_id == *blocked {
                    return Err(pulsearc_domain::SyncError::Connection("downstream create failed".to_string()));
                }
            }
            Ok(serde_json::json!({
                "id": format!("gcal-{}", body.extended_properties.insper_event_id),
                "summary": body.title,
                "description": body.description,
                "location": body.location,
                "start": {"dateTime": body.start.to_rfc3339()},
                "end": {"dateTime": body.end.to_rfc3339()},
                "extendedProperties": {
                    "private": {
                        "insper_event_id": body.extended_properties.insper_event_id,
                        "sync_source": body.extended_properties.sync_source,
                    }
                }
            }))
        }

        async fn update_event(
            &self,
            _access_token: &str,
            _calendar_id: &str,
            event_id: &str,
            body: &DownstreamEventPayload,
        ) -> SyncResult<Value> {
            *self.update_calls.lock().unwrap() += 1;
            Ok(serde_json::json!({
                "id": event_id,
                "summary": body.title,
                "description": body.description,
                "location": body.location,
                "start": {"dateTime": body.start.to_rfc3339()},
                "end": {"dateTime": body.end.to_rfc3339()},
                "extendedProperties": {
                    "private": {
                        "insper_event_id": body.extended_properties.insper_event_id,
                        "sync_source": body.extended_properties.sync_source,
                    }
                }
            }))
        }

        async fn delete_event(&self, _access_token: &str, _calendar_id: &str, _event_id: &str) -> SyncResult<()> {
            *self.delete_calls.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn sample_upstream(id: &str, title: &str, instructor: &str) -> UpstreamEvent {
        UpstreamEvent {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            upstream_event_id: id.to_string(),
            title: title.to_string(),
            description: None,
            start_datetime: Utc.with_ymd_and_hms(2026, 3, 4, 13, 0, 0).unwrap(),
            end_datetime: Utc.with_ymd_and_hms(2026, 3, 4, 15, 0, 0).unwrap(),
            all_day: false,
            discipline_code: Some("MATH101".to_string()),
            instructor: Some(instructor.to_string()),
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

    fn reconciler() -> (Reconciler, Arc<FakeDownstream>) {
        let store = Arc::new(FakeStore::default());
        let downstream = Arc::new(FakeDownstream::default());
        (Reconciler::new(store, downstream.clone(), "https://sync.example.test".to_string()), downstream)
    }

    #[tokio::test]
    async fn first_time_sync_creates_both_events() {
        let (reconciler, downstream) = reconciler();
        let config = SyncConfiguration::default_for(Uuid::new_v4());
        let events = vec![sample_upstream("ev-A", "Math", "Alice"), sample_upstream("ev-B", "Physics", "Bob")];

        let stats = reconciler
            .reconcile(Uuid::new_v4(), Uuid::new_v4(), "token", &config, "cal-1", events, Vec::new())
            .await
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 2, updated: 0, deleted: 0, failed: 0 });
        assert_eq!(*downstream.create_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn orphan_without_marker_is_invisible() {
        let (reconciler, downstream) = reconciler();
        let config = SyncConfiguration::default_for(Uuid::new_v4());

        let personal_event = DownstreamEvent {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            downstream_event_id: "personal-1".to_string(),
            downstream_calendar_id: "cal-1".to_string(),
            title: "Dentist".to_string(),
            description: None,
            start_datetime: Utc::now(),
            end_datetime: Utc::now(),
            all_day: false,
            location: None,
            html_link: None,
            raw_payload: Value::Null,
            content_hash: String::new(),
            is_active: true,
            synced_from_upstream: false,
        };

        let stats = reconciler
            .reconcile(Uuid::new_v4(), Uuid::new_v4(), "token", &config, "cal-1", Vec::new(), vec![personal_event])
            .await
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 0, updated: 0, deleted: 0, failed: 0 });
        assert_eq!(*downstream.delete_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn exclusion_hides_event_from_both_create_and_sweep() {
        let (reconciler, downstream) = reconciler();
        let mut config = SyncConfiguration::default_for(Uuid::new_v4());
        config.sync_all_events = false;
        config.excluded_disciplines.insert("MATH101".to_string());

        let events = vec![sample_upstream("ev-A", "Math", "Alice")];
        let stats = reconciler
            .reconcile(Uuid::new_v4(), Uuid::new_v4(), "token", &config, "cal-1", events, Vec::new())
            .await
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 0, updated: 0, deleted: 0, failed: 0 });
        assert_eq!(*downstream.create_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn partial_failure_on_create_is_isolated() {
        let (reconciler, downstream) = reconciler();
        *downstream.fail_create_for.lock().unwrap() = Some("ev-B".to_string());
        let config = SyncConfiguration::default_for(Uuid::new_v4());
        let events = vec![sample_upstream("ev-A", "Math", "Alice"), sample_upstream("ev-B", "Physics", "Bob")];

        let stats = reconciler
            .reconcile(Uuid::new_v4(), Uuid::new_v4(), "token", &config, "cal-1", events, Vec::new())
            .await
            .unwrap();

        assert_eq!(stats, ReconcileStats { created: 1, updated: 0, deleted: 0, failed: 1 });
    }
}
