//! Concrete `DownstreamCalendarClient` (C7): a thin HTTP wrapper over the
//! downstream calendar provider's REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulsearc_core::ports::{
    CalendarListEntry, DownstreamCalendarClient, DownstreamEventPayload,
};
use pulsearc_domain::{SyncError, SyncResult};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::instrument;

const DOWNSTREAM_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const SYNC_CALENDAR_DESCRIPTION: &str = "Managed automatically. Do not edit events here directly.";
const SYNC_CALENDAR_TIMEZONE: &str = "America/Sao_Paulo";

#[derive(Debug, serde::Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

#[derive(Debug, serde::Deserialize)]
struct EventsListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

pub struct GoogleCalendarClient {
    client: Client,
    base_url: String,
}

impl GoogleCalendarClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client, base_url: DOWNSTREAM_API_BASE.to_string() }
    }

    #[must_use]
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn payload_to_json(body: &DownstreamEventPayload) -> Value {
        let mut event = json!({
            "summary": body.title,
            "description": body.description,
            "start": { "dateTime": body.start.to_rfc3339() },
            "end": { "dateTime": body.end.to_rfc3339() },
            "location": body.location,
            "extendedProperties": {
                "private": {
                    "insper_event_id": body.extended_properties.insper_event_id,
                    "sync_source": body.extended_properties.sync_source,
                    "disciplina_codigo": body.extended_properties.disciplina_codigo,
                    "docente": body.extended_properties.docente,
                    "turma": body.extended_properties.turma,
                }
            },
        });

        if let Some(source) = &body.source {
            event["source"] = json!({ "title": source.title, "url": source.url });
        }

        event
    }
}

#[async_trait]
impl DownstreamCalendarClient for GoogleCalendarClient {
    #[instrument(skip(self, access_token))]
    async fn find_or_create_sync_calendar(&self, access_token: &str, display_name: &str) -> SyncResult<String> {
        let calendars = self.list_calendars(access_token).await?;
        let needle = display_name.trim().to_lowercase();

        if let Some(existing) = calendars.iter().find(|c| c.summary.trim().to_lowercase() == needle) {
            return Ok(existing.id.clone());
        }

        let response = self
            .client
            .post(self.url("/calendars"))
            .bearer_auth(access_token)
            .json(&json!({
                "summary": display_name,
                "description": SYNC_CALENDAR_DESCRIPTION,
                "timeZone": SYNC_CALENDAR_TIMEZONE,
            }))
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("create calendar request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Connection(format!("create calendar failed with status {status}: {body}")));
        }

        let created: Value = response
            .json()
            .await
            .map_err(|err| SyncError::Connection(format!("invalid create-calendar response: {err}")))?;

        created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SyncError::Connection("create-calendar response had no id".to_string()))
    }

    #[instrument(skip(self, access_token))]
    async fn list_calendars(&self, access_token: &str) -> SyncResult<Vec<CalendarListEntry>> {
        let response = self
            .client
            .get(self.url("/users/me/calendarList"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("list calendars request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Connection(format!("list calendars failed with status {status}: {body}")));
        }

        let parsed: CalendarListResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Connection(format!("invalid calendar list response: {err}")))?;

        Ok(parsed.items)
    }

    #[instrument(skip(self, access_token))]
    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: u32,
    ) -> SyncResult<Vec<Value>> {
        let response = self
            .client
            .get(self.url(&format!("/calendars/{calendar_id}/events")))
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("list events request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Connection(format!("list events failed with status {status}: {body}")));
        }

        let parsed: EventsListResponse = response
            .json()
            .await
            .map_err(|err| SyncError::Connection(format!("invalid events list response: {err}")))?;

        Ok(parsed.items)
    }

    #[instrument(skip(self, access_token, body))]
    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        body: &DownstreamEventPayload,
    ) -> SyncResult<Value> {
        let response = self
            .client
            .post(self.url(&format!("/calendars/{calendar_id}/events")))
            .bearer_auth(access_token)
            .json(&Self::payload_to_json(body))
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("create event request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::Connection(format!("create event failed with status {status}: {text}")));
        }

        response
            .json()
            .await
            .map_err(|err| SyncError::Connection(format!("invalid create-event response: {err}")))
    }

    #[instrument(skip(self, access_token, body))]
    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        body: &DownstreamEventPayload,
    ) -> SyncResult<Value> {
        let mut payload = Self::payload_to_json(body);
        if let Some(obj) = payload.as_object_mut() {
            obj.remove("source");
        }

        let response = self
            .client
            .put(self.url(&format!("/calendars/{calendar_id}/events/{event_id}")))
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("update event request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::Connection(format!("update event failed with status {status}: {text}")));
        }

        response
            .json()
            .await
            .map_err(|err| SyncError::Connection(format!("invalid update-event response: {err}")))
    }

    #[instrument(skip(self, access_token))]
    async fn delete_event(&self, access_token: &str, calendar_id: &str, event_id: &str) -> SyncResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/calendars/{calendar_id}/events/{event_id}")))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("delete event request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::NO_CONTENT {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::Connection(format!("delete event failed with status {status}: {text}")));
        }

        Ok(())
    }
}

#[must_use]
pub fn default_downstream_client() -> GoogleCalendarClient {
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest client with static config always builds");
    GoogleCalendarClient::new(client)
}
