//! Port interface for the downstream calendar client (C7): a thin wrapper
//! over the remote calendar HTTP API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulsearc_domain::SyncResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry from `listCalendars`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarListEntry {
    pub id: String,
    pub summary: String,
}

/// The private extended properties the reconciler stamps onto every
/// downstream event it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedProperties {
    pub insper_event_id: String,
    pub sync_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disciplina_codigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turma: Option<String>,
}

/// The event-creation/update `source` attribution block. Sent on create
/// only — never on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    pub title: String,
    pub url: String,
}

/// The desired downstream event payload, as formatted by the reconciler
/// (§4.7). `source` is `None` on update calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamEventPayload {
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
    pub extended_properties: ExtendedProperties,
}

/// All operations require a bearer token (§4.5); the caller (the OAuth
/// token manager's consumer) supplies a fresh one per call rather than the
/// client holding per-user state, since one client instance is shared
/// across users.
#[async_trait]
pub trait DownstreamCalendarClient: Send + Sync {
    /// List calendars, match on case-insensitive trimmed display-name
    /// equality; if not found, create a new calendar with timezone
    /// `America/Sao_Paulo` and a fixed description; return its id.
    async fn find_or_create_sync_calendar(&self, access_token: &str, display_name: &str) -> SyncResult<String>;

    /// Raw calendar-list listing, used by `find_or_create_sync_calendar`.
    async fn list_calendars(&self, access_token: &str) -> SyncResult<Vec<CalendarListEntry>>;

    /// List events in `[time_min, time_max]`, `singleEvents=true`,
    /// `orderBy=startTime`, bounded to `max_results`.
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: u32,
    ) -> SyncResult<Vec<Value>>;

    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        body: &DownstreamEventPayload,
    ) -> SyncResult<Value>;

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        body: &DownstreamEventPayload,
    ) -> SyncResult<Value>;

    /// Delete succeeds on HTTP 204; any other status surfaces the body as
    /// the error string.
    async fn delete_event(&self, access_token: &str, calendar_id: &str, event_id: &str) -> SyncResult<()>;
}
