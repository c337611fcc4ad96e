//! Concrete `CalendarScraper` + `CalendarScraperFactory` (C5): monthly-paged
//! scraping of the portal's events endpoint, with field extraction out of
//! the free-text payload.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use pulsearc_core::ports::{AcademicProfileFetcher, CalendarScraper, CalendarScraperFactory, PortalSession};
use pulsearc_domain::constants::{SYNC_TIMEZONE as SYNC_TIMEZONE_NAME, UPSTREAM_EVENTS_PAGE_SIZE};
use pulsearc_domain::utils::extraction::{
    class_group_from_descricao, discipline_code_from_title, instructor_from_hover_info,
    location_from_descricao,
};
use pulsearc_domain::{SyncError, SyncResult, UpstreamEvent, User};
use serde_json::Value;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::adapters::academic_profile::PortalAcademicProfileFetcher as ConcreteAcademicProfileFetcher;
use crate::adapters::portal_session::HttpPortalSession;

const PORTAL_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Scoped to one user's authenticated session.
pub struct HttpCalendarScraper {
    session: Arc<dyn PortalSession>,
    portal_id: String,
    cod_aluno: String,
    user_id: Uuid,
}

impl HttpCalendarScraper {
    async fn fetch_month(&self, year: i32, month: u32) -> SyncResult<Vec<Value>> {
        let month_start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| SyncError::Internal(format!("invalid month {year}-{month}")))?;
        let month_end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| SyncError::Internal(format!("invalid month {year}-{month}")))?
        .pred_opt()
        .ok_or_else(|| SyncError::Internal(format!("invalid month end {year}-{month}")))?;

        let path = format!(
            "/AOnline/apix/api/rest/alunos/pessoa/{}/events?codAluno={}&start={}&end={}&page=0&size={}&timezone=false",
            urlencoding::encode(&self.portal_id),
            urlencoding::encode(&self.cod_aluno),
            urlencoding::encode(&format_boundary(month_start)),
            urlencoding::encode(&format_boundary(month_end)),
            UPSTREAM_EVENTS_PAGE_SIZE,
        );

        let body = self.session.authed_get(&path).await?;

        let envelope: EventsEnvelope = serde_json::from_str(&body)
            .map_err(|err| SyncError::Connection(format!("invalid events response: {err}")))?;

        Ok(envelope.content)
    }
}

fn format_boundary(date: NaiveDate) -> String {
    format!("{}T00:00:00.000-03:00", date.format("%Y-%m-%d"))
}

#[derive(Debug, serde::Deserialize)]
struct EventsEnvelope {
    #[serde(default)]
    content: Vec<Value>,
}

fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let mut cursor_year = start.year();
    let mut cursor_month = start.month();

    loop {
        months.push((cursor_year, cursor_month));
        if cursor_year == end.year() && cursor_month == end.month() {
            break;
        }
        if cursor_month == 12 {
            cursor_year += 1;
            cursor_month = 1;
        } else {
            cursor_month += 1;
        }
    }

    months
}

fn upstream_event_from_value(value: &Value, user_id: Uuid) -> Option<UpstreamEvent> {
    let upstream_event_id = value.get("eventId").and_then(Value::as_str)?.to_string();
    let title = value.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
    let hover_info = value.get("hoverInfo").and_then(Value::as_str).unwrap_or_default();
    let descricao = value.get("descricao").and_then(Value::as_str).unwrap_or_default();
    let start_ms = value.get("startDate").and_then(Value::as_i64)?;
    let end_ms = value.get("endDate").and_then(Value::as_i64).unwrap_or(start_ms);
    let all_day = value.get("allDay").and_then(Value::as_bool).unwrap_or(false);
    let event_kind = value.get("tipoEvento").and_then(Value::as_str).map(str::to_string);
    let description = (!descricao.is_empty()).then(|| descricao.to_string());

    let start_datetime = Utc.timestamp_millis_opt(start_ms).single()?;
    let end_datetime = Utc.timestamp_millis_opt(end_ms).single()?;

    let discipline_code = discipline_code_from_title(&title);
    let instructor = instructor_from_hover_info(hover_info);
    let class_group = class_group_from_descricao(descricao);
    let location = Some(location_from_descricao(descricao));

    let mut event = UpstreamEvent {
        id: Uuid::new_v4(),
        user_id,
        upstream_event_id,
        title,
        description,
        start_datetime,
        end_datetime,
        all_day,
        discipline_code,
        instructor,
        class_group,
        location,
        event_kind,
        source_timezone: SYNC_TIMEZONE_NAME.to_string(),
        raw_payload: value.clone(),
        content_hash: String::new(),
        is_active: true,
        last_seen_at: Utc::now(),
    };
    event.recompute_hash();
    Some(event)
}

#[async_trait]
impl CalendarScraper for HttpCalendarScraper {
    #[instrument(skip(self))]
    async fn get_events_for_range(&self, start: NaiveDate, end: NaiveDate) -> SyncResult<Vec<UpstreamEvent>> {
        let range_start = bound_of_day(start);
        let range_end = bound_of_day(end) + chrono::Duration::days(1);

        let mut events = Vec::new();
        for (year, month) in months_between(start, end) {
            match self.fetch_month(year, month).await {
                Ok(raw_events) => {
                    for raw in &raw_events {
                        let Some(event) = upstream_event_from_value(raw, self.user_id) else {
                            warn!(year, month, "skipping upstream event with no eventId or startDate");
                            continue;
                        };
                        if event.start_datetime >= range_start && event.start_datetime < range_end {
                            events.push(event);
                        }
                    }
                }
                Err(err) => {
                    warn!(year, month, error = %err, "failed to fetch month, continuing with partial range");
                }
            }
        }

        Ok(events)
    }
}

fn bound_of_day(date: NaiveDate) -> DateTime<Utc> {
    PORTAL_TIMEZONE
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::<Utc>::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0).unwrap(), Utc))
}

/// Produces a scraper scoped to one user, owning the C3 login handshake
/// with the user's stored ciphertext password.
pub struct HttpCalendarScraperFactory {
    base_url: String,
}

impl HttpCalendarScraperFactory {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

#[async_trait]
impl CalendarScraperFactory for HttpCalendarScraperFactory {
    #[instrument(skip(self, user))]
    async fn scraper_for(&self, user: &User) -> SyncResult<Arc<dyn CalendarScraper>> {
        let username = user
            .portal_username
            .as_deref()
            .ok_or_else(|| SyncError::Config(format!("user {} has no portal username", user.id)))?;
        let ciphertext = user
            .portal_password_ciphertext
            .as_deref()
            .ok_or_else(|| SyncError::Config(format!("user {} has no stored portal password", user.id)))?;

        let session: Arc<dyn PortalSession> = Arc::new(HttpPortalSession::new(&self.base_url)?);
        let identity = session.login(username, ciphertext).await?;

        let profile_fetcher = ConcreteAcademicProfileFetcher::new(session.clone());
        let academic_data = profile_fetcher
            .get_academic_data(&identity.id)
            .await?
            .ok_or_else(|| SyncError::Auth(format!("no academic profile found for portal id {}", identity.id)))?;

        Ok(Arc::new(HttpCalendarScraper {
            session,
            portal_id: identity.id,
            cod_aluno: academic_data.cod_aluno,
            user_id: user.id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_between_single_month() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        assert_eq!(months_between(start, end), vec![(2026, 3)]);
    }

    #[test]
    fn months_between_spans_year_boundary() {
        let start = NaiveDate::from_ymd_opt(2026, 11, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2027, 1, 10).unwrap();
        assert_eq!(months_between(start, end), vec![(2026, 11), (2026, 12), (2027, 1)]);
    }

    #[test]
    fn extracts_event_fields_from_raw_payload() {
        let raw = serde_json::json!({
            "eventId": "evt-1",
            "title": "Calculo II\nMAT201",
            "hoverInfo": "Aula | Docente: Prof. Silva",
            "descricao": "Turma: A | Dependencia: Sala 301",
            "startDate": 1_772_715_600_000i64,
            "endDate": 1_772_722_800_000i64,
            "allDay": false,
            "tipoEvento": "aula",
        });

        let event = upstream_event_from_value(&raw, Uuid::new_v4()).unwrap();
        assert_eq!(event.upstream_event_id, "evt-1");
        assert_eq!(event.discipline_code.as_deref(), Some("MAT201"));
        assert_eq!(event.instructor.as_deref(), Some("Prof. Silva"));
        assert_eq!(event.class_group.as_deref(), Some("A"));
        assert_eq!(event.location.as_deref(), Some("Sala 301"));
    }

    #[test]
    fn skips_event_without_event_id() {
        let raw = serde_json::json!({
            "title": "Calculo II",
            "startDate": 1_772_715_600_000i64,
        });
        assert!(upstream_event_from_value(&raw, Uuid::new_v4()).is_none());
    }
}
