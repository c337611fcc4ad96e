//! Upstream and downstream event mirrors.
//!
//! Both sides carry a `content_hash`: a hex MD5 digest over a canonical
//! (sorted-key) JSON subset of their attributes. The hash is purely
//! advisory — it speeds up "has anything changed?" queries — the
//! authoritative change test used by the reconciler is the field-by-field
//! comparison in C9.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;
use uuid::Uuid;

fn canonical_hash(fields: &[(&str, Value)]) -> String {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert((*key).to_string(), value.clone());
    }
    // serde_json::Map is BTreeMap-backed (no `preserve_order` feature), so
    // this serialises with keys in sorted order.
    let canonical = Value::Object(map).to_string();

    let mut hasher = Md5::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mirror of an upstream academic event, keyed by (user, upstream_event_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct UpstreamEvent {
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub id: Uuid,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub user_id: Uuid,

    /// The portal's `eventId` field — NOT `id`, which may be null for
    /// recurring instances.
    pub upstream_event_id: String,

    pub title: String,
    pub description: Option<String>,

    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub start_datetime: DateTime<Utc>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub end_datetime: DateTime<Utc>,
    pub all_day: bool,

    pub discipline_code: Option<String>,
    pub instructor: Option<String>,
    pub class_group: Option<String>,
    pub location: Option<String>,

    /// Upstream's `tipo_evento` field, used by the reconciler's exclusion
    /// filter.
    pub event_kind: Option<String>,

    pub source_timezone: String,

    /// Opaque copy of the upstream JSON payload, kept for forward
    /// compatibility and diagnostics.
    pub raw_payload: Value,

    pub content_hash: String,
    pub is_active: bool,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub last_seen_at: DateTime<Utc>,
}

impl UpstreamEvent {
    /// Recompute `content_hash` from the current attribute values. Must be
    /// called before every Event Store write.
    pub fn recompute_hash(&mut self) {
        self.content_hash = self.compute_hash();
    }

    #[must_use]
    pub fn compute_hash(&self) -> String {
        canonical_hash(&[
            ("title", Value::String(self.title.clone())),
            (
                "description",
                self.description.clone().map_or(Value::Null, Value::String),
            ),
            ("start_datetime", Value::String(self.start_datetime.to_rfc3339())),
            ("end_datetime", Value::String(self.end_datetime.to_rfc3339())),
            ("all_day", Value::Bool(self.all_day)),
            (
                "disciplina_codigo",
                self.discipline_code.clone().map_or(Value::Null, Value::String),
            ),
            ("docente", self.instructor.clone().map_or(Value::Null, Value::String)),
            ("turma", self.class_group.clone().map_or(Value::Null, Value::String)),
            ("tipo_evento", self.event_kind.clone().map_or(Value::Null, Value::String)),
        ])
    }
}

/// Mirror of a downstream (Google Calendar) event, keyed by
/// (user, downstream_event_id).
///
/// Invariant: the reconciler only touches downstream events whose raw
/// payload carries the private extended property
/// `sync_source = "insper"`; all others are invisible to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct DownstreamEvent {
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub id: Uuid,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub user_id: Uuid,

    pub downstream_event_id: String,
    pub downstream_calendar_id: String,

    pub title: String,
    pub description: Option<String>,

    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub start_datetime: DateTime<Utc>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub end_datetime: DateTime<Utc>,
    pub all_day: bool,

    pub location: Option<String>,
    pub html_link: Option<String>,

    pub raw_payload: Value,
    pub content_hash: String,
    pub is_active: bool,

    /// True iff this downstream event was produced by the reconciler
    /// (carries the `sync_source = "insper"` marker).
    pub synced_from_upstream: bool,
}

impl DownstreamEvent {
    pub fn recompute_hash(&mut self) {
        self.content_hash = self.compute_hash();
    }

    #[must_use]
    pub fn compute_hash(&self) -> String {
        canonical_hash(&[
            ("title", Value::String(self.title.clone())),
            (
                "description",
                self.description.clone().map_or(Value::Null, Value::String),
            ),
            ("start_datetime", Value::String(self.start_datetime.to_rfc3339())),
            ("end_datetime", Value::String(self.end_datetime.to_rfc3339())),
            ("all_day", Value::Bool(self.all_day)),
            ("location", self.location.clone().map_or(Value::Null, Value::String)),
        ])
    }

    /// Extracts the upstream join key from
    /// `raw_data.extendedProperties.private.insper_event_id`, returning
    /// `None` when the marker is absent (the event belongs to the user, not
    /// to this synchroniser).
    #[must_use]
    pub fn upstream_marker_id(&self) -> Option<&str> {
        self.raw_payload
            .get("extendedProperties")?
            .get("private")?
            .get("insper_event_id")?
            .as_str()
    }

    /// True iff the raw payload carries `sync_source = "insper"`.
    #[must_use]
    pub fn carries_sync_marker(&self) -> bool {
        self.raw_payload
            .get("extendedProperties")
            .and_then(|v| v.get("private"))
            .and_then(|v| v.get("sync_source"))
            .and_then(Value::as_str)
            == Some(crate::constants::SYNC_SOURCE_MARKER)
    }
}
