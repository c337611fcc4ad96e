//! Converts the downstream calendar API's raw JSON event shape into the
//! domain's `DownstreamEvent` mirror.

use chrono::{DateTime, Utc};
use pulsearc_domain::DownstreamEvent;
use serde_json::Value;
use uuid::Uuid;

fn base_event(user_id: Uuid, calendar_id: &str, raw: &Value) -> DownstreamEvent {
    let id_str = raw.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
    let title = raw.get("summary").and_then(Value::as_str).unwrap_or_default().to_string();
    let description = raw.get("description").and_then(Value::as_str).map(str::to_string);
    let location = raw.get("location").and_then(Value::as_str).map(str::to_string);
    let html_link = raw.get("htmlLink").and_then(Value::as_str).map(str::to_string);

    let start = parse_event_time(raw.get("start"));
    let end = parse_event_time(raw.get("end"));
    let all_day = raw.get("start").and_then(|s| s.get("date")).is_some();

    DownstreamEvent {
        id: Uuid::new_v4(),
        user_id,
        downstream_event_id: id_str,
        downstream_calendar_id: calendar_id.to_string(),
        title,
        description,
        start_datetime: start,
        end_datetime: end,
        all_day,
        location,
        html_link,
        raw_payload: raw.clone(),
        content_hash: String::new(),
        is_active: true,
        synced_from_upstream: true,
    }
}

/// Builds a `DownstreamEvent` mirror row from the raw JSON the calendar API
/// returned on a just-issued create/update call, stamping the sync marker
/// if the response echoed it back incompletely. Safe here because we just
/// wrote this event ourselves and know its upstream counterpart.
pub(crate) fn downstream_event_from_raw(
    user_id: Uuid,
    calendar_id: &str,
    raw: &Value,
    upstream_event_id: &str,
) -> DownstreamEvent {
    let mut event = base_event(user_id, calendar_id, raw);

    if event.upstream_marker_id().is_none() {
        event.raw_payload = serde_json::json!({
            "extendedProperties": {
                "private": {
                    "insper_event_id": upstream_event_id,
                    "sync_source": pulsearc_domain::constants::SYNC_SOURCE_MARKER,
                }
            }
        });
    }

    event
}

/// Builds a `DownstreamEvent` mirror row from a `listEvents` result.
/// Never stamps a marker — a listed event's ownership is exactly what its
/// raw payload says, since events with no marker belong to the user, not to
/// this synchroniser (§9 "Extended-property contract").
pub(crate) fn downstream_event_from_listed_raw(user_id: Uuid, calendar_id: &str, raw: &Value) -> DownstreamEvent {
    base_event(user_id, calendar_id, raw)
}

pub(crate) fn parse_event_time(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(|v| v.get("dateTime").or_else(|| v.get("date")))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
