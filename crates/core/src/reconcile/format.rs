//! Builds the desired downstream payload for an upstream event (§4.7
//! "Downstream event formatting") and the stable subset of it used by the
//! update-if-changed diff.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use pulsearc_domain::{SyncConfiguration, UpstreamEvent};

use crate::ports::{DownstreamEventPayload, EventSource, ExtendedProperties};

const SYNC_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;
const SEPARATOR: &str = "---";
const FOOTER: &str = "Sincronizado automaticamente via Insper Sync";
const INSPER_PREFIX: &str = "[Insper] ";

fn title_for(upstream: &UpstreamEvent, config: &SyncConfiguration) -> String {
    if config.add_insper_prefix {
        format!("{INSPER_PREFIX}{}", upstream.title)
    } else {
        upstream.title.clone()
    }
}

/// The description lines that participate in change detection: everything
/// except the wall-clock "Última atualização" line, which always differs
/// between runs and must not by itself trigger an update.
fn description_body(upstream: &UpstreamEvent, config: &SyncConfiguration) -> String {
    let mut lines = Vec::new();

    if let Some(description) = upstream.description.as_deref() {
        if !description.is_empty() {
            lines.push(description.to_string());
        }
    }

    if config.include_discipline_code {
        if let Some(code) = upstream.discipline_code.as_deref() {
            lines.push(format!("Código da disciplina: {code}"));
        }
    }

    if config.include_instructor {
        if let Some(instructor) = upstream.instructor.as_deref() {
            lines.push(format!("Docente: {instructor}"));
        }
    }

    if let Some(group) = upstream.class_group.as_deref() {
        lines.push(format!("Turma: {group}"));
    }

    if let Some(location) = upstream.location.as_deref() {
        lines.push(format!("Local: {location}"));
    }

    lines.push(SEPARATOR.to_string());
    lines.push(FOOTER.to_string());
    lines.join("\n")
}

/// Appends the timestamp line to a previously built `description_body`,
/// producing the text actually sent to the downstream calendar.
fn with_timestamp(body: &str, now: DateTime<Utc>) -> String {
    let stamped = now.with_timezone(&SYNC_TIMEZONE).format("%d/%m/%Y %H:%M");
    format!("{body}\nÚltima atualização: {stamped}")
}

/// Strips a previously appended "Última atualização" line, if present, so a
/// stored downstream description can be compared against a freshly built
/// `description_body` without the timestamp line always causing a mismatch.
pub fn strip_timestamp_line(description: &str) -> &str {
    match description.rsplit_once('\n') {
        Some((rest, last)) if last.starts_with("Última atualização: ") => rest,
        _ => description,
    }
}

fn extended_properties(upstream: &UpstreamEvent) -> ExtendedProperties {
    ExtendedProperties {
        insper_event_id: upstream.upstream_event_id.clone(),
        sync_source: pulsearc_domain::constants::SYNC_SOURCE_MARKER.to_string(),
        disciplina_codigo: upstream.discipline_code.clone(),
        docente: upstream.instructor.clone(),
        turma: upstream.class_group.clone(),
    }
}

/// The fields of the desired downstream event that participate in the
/// update-if-changed comparison: title, description body (sans timestamp),
/// start, end (§4.7 step 3).
pub struct DesiredFields {
    pub title: String,
    pub description_body: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn desired_fields(upstream: &UpstreamEvent, config: &SyncConfiguration) -> DesiredFields {
    DesiredFields {
        title: title_for(upstream, config),
        description_body: description_body(upstream, config),
        start: upstream.start_datetime,
        end: upstream.end_datetime,
    }
}

/// Builds the full payload to send on create or update. `source` is
/// populated iff `include_source` (create only, §4.7).
pub fn build_payload(
    upstream: &UpstreamEvent,
    config: &SyncConfiguration,
    now: DateTime<Utc>,
    include_source: bool,
    source_url: &str,
) -> DownstreamEventPayload {
    let body = description_body(upstream, config);
    DownstreamEventPayload {
        title: title_for(upstream, config),
        description: with_timestamp(&body, now),
        start: upstream.start_datetime,
        end: upstream.end_datetime,
        location: upstream.location.clone().unwrap_or_default(),
        source: include_source.then(|| EventSource {
            title: "Insper Sync".to_string(),
            url: source_url.to_string(),
        }),
        extended_properties: extended_properties(upstream),
    }
}
