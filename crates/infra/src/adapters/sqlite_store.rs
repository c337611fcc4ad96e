//! Concrete `EventStore` and `UserRepository` (C8), backed by
//! `pulsearc_common::storage::pool::SqlitePool`.
//!
//! All timestamps are stored as timezone-aware RFC3339 text (the domain
//! types already carry `DateTime<Utc>`, so no naive-to-aware localisation is
//! needed at the write path). Every blocking rusqlite call runs inside
//! `spawn_blocking` so the async trait methods never stall the executor.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use pulsearc_common::storage::pool::SqlitePool;
use pulsearc_core::ports::{EventStore, UserRepository};
use pulsearc_domain::{
    DownstreamEvent, EventMapping, MappingStatus, SyncConfiguration, SyncError, SyncResult,
    SyncSession, SessionStatus, SyncDirection, UpstreamEvent, User,
};
use rusqlite::{params, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::InfraError;

/// Creates every table and index this adapter relies on, if absent.
pub fn init_schema(pool: &SqlitePool) -> SyncResult<()> {
    let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;

    conn.inner()
        .execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS upstream_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                upstream_event_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                start_datetime TEXT NOT NULL,
                end_datetime TEXT NOT NULL,
                all_day INTEGER NOT NULL,
                discipline_code TEXT,
                instructor TEXT,
                class_group TEXT,
                location TEXT,
                event_kind TEXT,
                source_timezone TEXT NOT NULL,
                raw_payload TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                last_seen_at TEXT NOT NULL,
                UNIQUE(user_id, upstream_event_id)
            );
            CREATE INDEX IF NOT EXISTS idx_upstream_events_user_start
                ON upstream_events(user_id, start_datetime);
            CREATE INDEX IF NOT EXISTS idx_upstream_events_content_hash
                ON upstream_events(content_hash);
            CREATE INDEX IF NOT EXISTS idx_upstream_events_active_user
                ON upstream_events(is_active, user_id);

            CREATE TABLE IF NOT EXISTS downstream_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                downstream_event_id TEXT NOT NULL,
                downstream_calendar_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                start_datetime TEXT NOT NULL,
                end_datetime TEXT NOT NULL,
                all_day INTEGER NOT NULL,
                location TEXT,
                html_link TEXT,
                raw_payload TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                synced_from_upstream INTEGER NOT NULL,
                UNIQUE(user_id, downstream_event_id)
            );
            CREATE INDEX IF NOT EXISTS idx_downstream_events_user_start
                ON downstream_events(user_id, start_datetime);
            CREATE INDEX IF NOT EXISTS idx_downstream_events_content_hash
                ON downstream_events(content_hash);
            CREATE INDEX IF NOT EXISTS idx_downstream_events_active_user
                ON downstream_events(is_active, user_id);

            CREATE TABLE IF NOT EXISTS event_mappings (
                id TEXT PRIMARY KEY,
                sync_session_id TEXT NOT NULL,
                upstream_event_id TEXT NOT NULL,
                downstream_event_id TEXT NOT NULL,
                status TEXT NOT NULL,
                direction TEXT NOT NULL,
                error_message TEXT,
                needs_manual_review INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sync_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                upstream_found INTEGER NOT NULL,
                downstream_found INTEGER NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL,
                deleted INTEGER NOT NULL,
                failed INTEGER NOT NULL,
                error_message TEXT,
                error_details TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_sync_sessions_status_started
                ON sync_sessions(status, started_at DESC);
            CREATE INDEX IF NOT EXISTS idx_sync_sessions_user_started
                ON sync_sessions(user_id, started_at DESC);

            CREATE TABLE IF NOT EXISTS sync_configurations (
                user_id TEXT PRIMARY KEY,
                sync_enabled INTEGER NOT NULL,
                frequency_hours INTEGER NOT NULL,
                google_calendar_name TEXT NOT NULL,
                add_insper_prefix INTEGER NOT NULL,
                include_instructor INTEGER NOT NULL,
                include_discipline_code INTEGER NOT NULL,
                sync_all_events INTEGER NOT NULL,
                excluded_event_kinds TEXT NOT NULL,
                excluded_disciplines TEXT NOT NULL,
                last_sync_attempt TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_sync_configurations_enabled_attempt
                ON sync_configurations(sync_enabled, last_sync_attempt);

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                portal_username TEXT,
                portal_password_ciphertext TEXT,
                oauth_access_token TEXT,
                oauth_refresh_token TEXT,
                oauth_expires_at TEXT,
                downstream_calendar_id TEXT,
                email_verified INTEGER NOT NULL,
                portal_credentials_configured INTEGER NOT NULL,
                downstream_connected INTEGER NOT NULL,
                active INTEGER NOT NULL,
                last_sync TEXT
            );
            ",
        )
        .map_err(|err| InfraError::from(err).0)?;

    Ok(())
}

fn parse_datetime(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err)))
}

fn upstream_event_from_row(row: &Row<'_>) -> rusqlite::Result<UpstreamEvent> {
    let raw_payload: String = row.get("raw_payload")?;
    Ok(UpstreamEvent {
        id: row.get::<_, String>("id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        user_id: row.get::<_, String>("user_id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        upstream_event_id: row.get("upstream_event_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        start_datetime: parse_datetime(&row.get::<_, String>("start_datetime")?)?,
        end_datetime: parse_datetime(&row.get::<_, String>("end_datetime")?)?,
        all_day: row.get("all_day")?,
        discipline_code: row.get("discipline_code")?,
        instructor: row.get("instructor")?,
        class_group: row.get("class_group")?,
        location: row.get("location")?,
        event_kind: row.get("event_kind")?,
        source_timezone: row.get("source_timezone")?,
        raw_payload: serde_json::from_str(&raw_payload).unwrap_or(serde_json::Value::Null),
        content_hash: row.get("content_hash")?,
        is_active: row.get("is_active")?,
        last_seen_at: parse_datetime(&row.get::<_, String>("last_seen_at")?)?,
    })
}

fn downstream_event_from_row(row: &Row<'_>) -> rusqlite::Result<DownstreamEvent> {
    let raw_payload: String = row.get("raw_payload")?;
    Ok(DownstreamEvent {
        id: row.get::<_, String>("id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        user_id: row.get::<_, String>("user_id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        downstream_event_id: row.get("downstream_event_id")?,
        downstream_calendar_id: row.get("downstream_calendar_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        start_datetime: parse_datetime(&row.get::<_, String>("start_datetime")?)?,
        end_datetime: parse_datetime(&row.get::<_, String>("end_datetime")?)?,
        all_day: row.get("all_day")?,
        location: row.get("location")?,
        html_link: row.get("html_link")?,
        raw_payload: serde_json::from_str(&raw_payload).unwrap_or(serde_json::Value::Null),
        content_hash: row.get("content_hash")?,
        is_active: row.get("is_active")?,
        synced_from_upstream: row.get("synced_from_upstream")?,
    })
}

fn sync_session_from_row(row: &Row<'_>) -> rusqlite::Result<SyncSession> {
    let status: String = row.get("status")?;
    let completed_at: Option<String> = row.get("completed_at")?;
    let error_details: Option<String> = row.get("error_details")?;

    Ok(SyncSession {
        id: row.get::<_, String>("id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        user_id: row.get::<_, String>("user_id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        start_date: NaiveDate::parse_from_str(&row.get::<_, String>("start_date")?, "%Y-%m-%d")
            .map_err(|_| rusqlite::Error::InvalidQuery)?,
        end_date: NaiveDate::parse_from_str(&row.get::<_, String>("end_date")?, "%Y-%m-%d")
            .map_err(|_| rusqlite::Error::InvalidQuery)?,
        status: SessionStatus::from_str(&status).map_err(|_| rusqlite::Error::InvalidQuery)?,
        started_at: parse_datetime(&row.get::<_, String>("started_at")?)?,
        completed_at: completed_at.map(|s| parse_datetime(&s)).transpose()?,
        upstream_found: row.get("upstream_found")?,
        downstream_found: row.get("downstream_found")?,
        created: row.get("created")?,
        updated: row.get("updated")?,
        deleted: row.get("deleted")?,
        failed: row.get("failed")?,
        error_message: row.get("error_message")?,
        error_details: error_details.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn sync_configuration_from_row(row: &Row<'_>) -> rusqlite::Result<SyncConfiguration> {
    let excluded_event_kinds: String = row.get("excluded_event_kinds")?;
    let excluded_disciplines: String = row.get("excluded_disciplines")?;
    let last_sync_attempt: Option<String> = row.get("last_sync_attempt")?;

    Ok(SyncConfiguration {
        user_id: row.get::<_, String>("user_id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        sync_enabled: row.get("sync_enabled")?,
        frequency_hours: row.get("frequency_hours")?,
        google_calendar_name: row.get("google_calendar_name")?,
        add_insper_prefix: row.get("add_insper_prefix")?,
        include_instructor: row.get("include_instructor")?,
        include_discipline_code: row.get("include_discipline_code")?,
        sync_all_events: row.get("sync_all_events")?,
        excluded_event_kinds: serde_json::from_str::<HashSet<String>>(&excluded_event_kinds).unwrap_or_default(),
        excluded_disciplines: serde_json::from_str::<HashSet<String>>(&excluded_disciplines).unwrap_or_default(),
        last_sync_attempt: last_sync_attempt.map(|s| parse_datetime(&s)).transpose()?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let oauth_expires_at: Option<String> = row.get("oauth_expires_at")?;
    let last_sync: Option<String> = row.get("last_sync")?;

    Ok(User {
        id: row.get::<_, String>("id")?.parse().map_err(|_| rusqlite::Error::InvalidQuery)?,
        email: row.get("email")?,
        portal_username: row.get("portal_username")?,
        portal_password_ciphertext: row.get("portal_password_ciphertext")?,
        oauth_access_token: row.get("oauth_access_token")?,
        oauth_refresh_token: row.get("oauth_refresh_token")?,
        oauth_expires_at: oauth_expires_at.map(|s| parse_datetime(&s)).transpose()?,
        downstream_calendar_id: row.get("downstream_calendar_id")?,
        email_verified: row.get("email_verified")?,
        portal_credentials_configured: row.get("portal_credentials_configured")?,
        downstream_connected: row.get("downstream_connected")?,
        active: row.get("active")?,
        last_sync: last_sync.map(|s| parse_datetime(&s)).transpose()?,
    })
}

/// Durable mirror of upstream/downstream events, their mapping, and sync
/// bookkeeping (§4.6).
pub struct SqliteEventStore {
    pool: Arc<SqlitePool>,
}

impl SqliteEventStore {
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    #[instrument(skip(self, event))]
    async fn upsert_upstream_event(&self, event: &UpstreamEvent) -> SyncResult<()> {
        let pool = self.pool.clone();
        let event = event.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "INSERT INTO upstream_events (
                        id, user_id, upstream_event_id, title, description, start_datetime,
                        end_datetime, all_day, discipline_code, instructor, class_group,
                        location, event_kind, source_timezone, raw_payload, content_hash,
                        is_active, last_seen_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                    ON CONFLICT(user_id, upstream_event_id) DO UPDATE SET
                        title = excluded.title,
                        description = excluded.description,
                        start_datetime = excluded.start_datetime,
                        end_datetime = excluded.end_datetime,
                        all_day = excluded.all_day,
                        discipline_code = excluded.discipline_code,
                        instructor = excluded.instructor,
                        class_group = excluded.class_group,
                        location = excluded.location,
                        event_kind = excluded.event_kind,
                        content_hash = excluded.content_hash,
                        is_active = excluded.is_active,
                        last_seen_at = excluded.last_seen_at",
                    params![
                        event.id.to_string(),
                        event.user_id.to_string(),
                        event.upstream_event_id,
                        event.title,
                        event.description,
                        event.start_datetime.to_rfc3339(),
                        event.end_datetime.to_rfc3339(),
                        event.all_day,
                        event.discipline_code,
                        event.instructor,
                        event.class_group,
                        event.location,
                        event.event_kind,
                        event.source_timezone,
                        event.raw_payload.to_string(),
                        event.content_hash,
                        event.is_active,
                        event.last_seen_at.to_rfc3339(),
                    ],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self, event))]
    async fn upsert_downstream_event(&self, event: &DownstreamEvent) -> SyncResult<()> {
        let pool = self.pool.clone();
        let event = event.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "INSERT INTO downstream_events (
                        id, user_id, downstream_event_id, downstream_calendar_id, title,
                        description, start_datetime, end_datetime, all_day, location,
                        html_link, raw_payload, content_hash, is_active, synced_from_upstream
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                    ON CONFLICT(user_id, downstream_event_id) DO UPDATE SET
                        downstream_calendar_id = excluded.downstream_calendar_id,
                        title = excluded.title,
                        description = excluded.description,
                        start_datetime = excluded.start_datetime,
                        end_datetime = excluded.end_datetime,
                        all_day = excluded.all_day,
                        location = excluded.location,
                        html_link = excluded.html_link,
                        content_hash = excluded.content_hash,
                        is_active = excluded.is_active,
                        synced_from_upstream = excluded.synced_from_upstream",
                    params![
                        event.id.to_string(),
                        event.user_id.to_string(),
                        event.downstream_event_id,
                        event.downstream_calendar_id,
                        event.title,
                        event.description,
                        event.start_datetime.to_rfc3339(),
                        event.end_datetime.to_rfc3339(),
                        event.all_day,
                        event.location,
                        event.html_link,
                        event.raw_payload.to_string(),
                        event.content_hash,
                        event.is_active,
                        event.synced_from_upstream,
                    ],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self, mapping))]
    async fn upsert_event_mapping(&self, mapping: &EventMapping) -> SyncResult<()> {
        let pool = self.pool.clone();
        let mapping = mapping.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "INSERT INTO event_mappings (
                        id, sync_session_id, upstream_event_id, downstream_event_id, status,
                        direction, error_message, needs_manual_review, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(id) DO UPDATE SET
                        status = excluded.status,
                        error_message = excluded.error_message,
                        needs_manual_review = excluded.needs_manual_review,
                        updated_at = excluded.updated_at",
                    params![
                        mapping.id.to_string(),
                        mapping.sync_session_id.to_string(),
                        mapping.upstream_event_id.to_string(),
                        mapping.downstream_event_id.to_string(),
                        mapping.status.to_string(),
                        match mapping.direction {
                            SyncDirection::UpstreamToDownstream => "upstream_to_downstream",
                        },
                        mapping.error_message,
                        mapping.needs_manual_review,
                        mapping.created_at.to_rfc3339(),
                        mapping.updated_at.to_rfc3339(),
                    ],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn find_upstream_events_by_user(&self, user_id: Uuid) -> SyncResult<Vec<UpstreamEvent>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let mut stmt = conn
                .inner()
                .prepare("SELECT * FROM upstream_events WHERE user_id = ?1 ORDER BY start_datetime")
                .map_err(|err| InfraError::from(err).0)?;
            let rows = stmt
                .query_map(params![user_id.to_string()], upstream_event_from_row)
                .map_err(|err| InfraError::from(err).0)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|err| InfraError::from(err).0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn find_upstream_event_by_id(
        &self,
        user_id: Uuid,
        upstream_event_id: &str,
    ) -> SyncResult<Option<UpstreamEvent>> {
        let pool = self.pool.clone();
        let upstream_event_id = upstream_event_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let mut stmt = conn
                .inner()
                .prepare(
                    "SELECT * FROM upstream_events WHERE user_id = ?1 AND upstream_event_id = ?2",
                )
                .map_err(|err| InfraError::from(err).0)?;
            let mut rows = stmt
                .query_map(params![user_id.to_string(), upstream_event_id], upstream_event_from_row)
                .map_err(|err| InfraError::from(err).0)?;
            rows.next().transpose().map_err(|err| InfraError::from(err).0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn find_downstream_events_by_user(&self, user_id: Uuid) -> SyncResult<Vec<DownstreamEvent>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let mut stmt = conn
                .inner()
                .prepare("SELECT * FROM downstream_events WHERE user_id = ?1 ORDER BY start_datetime")
                .map_err(|err| InfraError::from(err).0)?;
            let rows = stmt
                .query_map(params![user_id.to_string()], downstream_event_from_row)
                .map_err(|err| InfraError::from(err).0)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|err| InfraError::from(err).0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self, session))]
    async fn create_sync_session(&self, session: &SyncSession) -> SyncResult<()> {
        let pool = self.pool.clone();
        let session = session.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "INSERT INTO sync_sessions (
                        id, user_id, start_date, end_date, status, started_at, completed_at,
                        upstream_found, downstream_found, created, updated, deleted, failed,
                        error_message, error_details
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        session.id.to_string(),
                        session.user_id.to_string(),
                        session.start_date.format("%Y-%m-%d").to_string(),
                        session.end_date.format("%Y-%m-%d").to_string(),
                        session.status.to_string(),
                        session.started_at.to_rfc3339(),
                        session.completed_at.map(|dt| dt.to_rfc3339()),
                        session.upstream_found,
                        session.downstream_found,
                        session.created,
                        session.updated,
                        session.deleted,
                        session.failed,
                        session.error_message,
                        session.error_details.as_ref().map(std::string::ToString::to_string),
                    ],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self, session))]
    async fn update_sync_session(&self, session: &SyncSession) -> SyncResult<()> {
        let pool = self.pool.clone();
        let session = session.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "UPDATE sync_sessions SET
                        status = ?2, completed_at = ?3, upstream_found = ?4, downstream_found = ?5,
                        created = ?6, updated = ?7, deleted = ?8, failed = ?9, error_message = ?10,
                        error_details = ?11
                    WHERE id = ?1",
                    params![
                        session.id.to_string(),
                        session.status.to_string(),
                        session.completed_at.map(|dt| dt.to_rfc3339()),
                        session.upstream_found,
                        session.downstream_found,
                        session.created,
                        session.updated,
                        session.deleted,
                        session.failed,
                        session.error_message,
                        session.error_details.as_ref().map(std::string::ToString::to_string),
                    ],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn get_sync_session(&self, id: Uuid) -> SyncResult<Option<SyncSession>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let mut stmt = conn
                .inner()
                .prepare("SELECT * FROM sync_sessions WHERE id = ?1")
                .map_err(|err| InfraError::from(err).0)?;
            let mut rows = stmt
                .query_map(params![id.to_string()], sync_session_from_row)
                .map_err(|err| InfraError::from(err).0)?;
            rows.next().transpose().map_err(|err| InfraError::from(err).0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn get_sync_configuration(&self, user_id: Uuid) -> SyncResult<Option<SyncConfiguration>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let mut stmt = conn
                .inner()
                .prepare("SELECT * FROM sync_configurations WHERE user_id = ?1")
                .map_err(|err| InfraError::from(err).0)?;
            let mut rows = stmt
                .query_map(params![user_id.to_string()], sync_configuration_from_row)
                .map_err(|err| InfraError::from(err).0)?;
            rows.next().transpose().map_err(|err| InfraError::from(err).0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self, config))]
    async fn upsert_sync_configuration(&self, config: &SyncConfiguration) -> SyncResult<()> {
        let pool = self.pool.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "INSERT INTO sync_configurations (
                        user_id, sync_enabled, frequency_hours, google_calendar_name,
                        add_insper_prefix, include_instructor, include_discipline_code,
                        sync_all_events, excluded_event_kinds, excluded_disciplines,
                        last_sync_attempt
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    ON CONFLICT(user_id) DO UPDATE SET
                        sync_enabled = excluded.sync_enabled,
                        frequency_hours = excluded.frequency_hours,
                        google_calendar_name = excluded.google_calendar_name,
                        add_insper_prefix = excluded.add_insper_prefix,
                        include_instructor = excluded.include_instructor,
                        include_discipline_code = excluded.include_discipline_code,
                        sync_all_events = excluded.sync_all_events,
                        excluded_event_kinds = excluded.excluded_event_kinds,
                        excluded_disciplines = excluded.excluded_disciplines,
                        last_sync_attempt = excluded.last_sync_attempt",
                    params![
                        config.user_id.to_string(),
                        config.sync_enabled,
                        config.frequency_hours,
                        config.google_calendar_name,
                        config.add_insper_prefix,
                        config.include_instructor,
                        config.include_discipline_code,
                        config.sync_all_events,
                        serde_json::to_string(&config.excluded_event_kinds).unwrap_or_default(),
                        serde_json::to_string(&config.excluded_disciplines).unwrap_or_default(),
                        config.last_sync_attempt.map(|dt| dt.to_rfc3339()),
                    ],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn has_recent_running_session(&self, user_id: Uuid, within: Duration) -> SyncResult<bool> {
        let pool = self.pool.clone();
        let cutoff = (Utc::now() - within).to_rfc3339();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let count: i64 = conn
                .inner()
                .query_row(
                    "SELECT COUNT(*) FROM sync_sessions
                     WHERE user_id = ?1 AND status = 'running' AND started_at >= ?2",
                    params![user_id.to_string(), cutoff],
                    |row| row.get(0),
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(count > 0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn delete_sync_sessions_older_than(&self, older_than_days: i64) -> SyncResult<u64> {
        let pool = self.pool.clone();
        let cutoff = (Utc::now() - Duration::days(older_than_days)).to_rfc3339();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let affected = conn
                .inner()
                .execute(
                    "DELETE FROM sync_sessions WHERE started_at < ?1 AND status != 'running'",
                    params![cutoff],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(affected as u64)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }
}

/// The `users` table: capability flags and per-user credentials (§4.6).
pub struct SqliteUserRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteUserRepository {
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self))]
    async fn get_by_id(&self, user_id: Uuid) -> SyncResult<Option<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let mut stmt = conn
                .inner()
                .prepare("SELECT * FROM users WHERE id = ?1")
                .map_err(|err| InfraError::from(err).0)?;
            let mut rows =
                stmt.query_map(params![user_id.to_string()], user_from_row).map_err(|err| InfraError::from(err).0)?;
            rows.next().transpose().map_err(|err| InfraError::from(err).0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn find_eligible_for_sync(&self) -> SyncResult<Vec<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            let mut stmt = conn
                .inner()
                .prepare(
                    "SELECT u.* FROM users u
                     JOIN sync_configurations c ON c.user_id = u.id
                     WHERE u.email_verified = 1 AND u.portal_credentials_configured = 1
                       AND u.downstream_connected = 1 AND u.active = 1
                       AND c.sync_enabled = 1",
                )
                .map_err(|err| InfraError::from(err).0)?;
            let rows = stmt.query_map(params![], user_from_row).map_err(|err| InfraError::from(err).0)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(|err| InfraError::from(err).0)
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn update_downstream_calendar_id(&self, user_id: Uuid, calendar_id: &str) -> SyncResult<()> {
        let pool = self.pool.clone();
        let calendar_id = calendar_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "UPDATE users SET downstream_calendar_id = ?2, downstream_connected = 1 WHERE id = ?1",
                    params![user_id.to_string(), calendar_id],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn update_last_sync(&self, user_id: Uuid, at: DateTime<Utc>) -> SyncResult<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "UPDATE users SET last_sync = ?2 WHERE id = ?1",
                    params![user_id.to_string(), at.to_rfc3339()],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self, access_token, refresh_token))]
    async fn update_oauth_tokens(
        &self,
        user_id: Uuid,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> SyncResult<()> {
        let pool = self.pool.clone();
        let access_token = access_token.to_string();
        let refresh_token = refresh_token.map(str::to_string);
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            match refresh_token {
                Some(refresh_token) => conn.inner().execute(
                    "UPDATE users SET oauth_access_token = ?2, oauth_refresh_token = ?3, oauth_expires_at = ?4 WHERE id = ?1",
                    params![user_id.to_string(), access_token, refresh_token, expires_at.to_rfc3339()],
                ),
                None => conn.inner().execute(
                    "UPDATE users SET oauth_access_token = ?2, oauth_expires_at = ?3 WHERE id = ?1",
                    params![user_id.to_string(), access_token, expires_at.to_rfc3339()],
                ),
            }
            .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }

    #[instrument(skip(self))]
    async fn clear_oauth_tokens(&self, user_id: Uuid) -> SyncResult<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get_sqlite_connection().map_err(|err| InfraError::from(err).0)?;
            conn.inner()
                .execute(
                    "UPDATE users SET oauth_access_token = NULL, oauth_refresh_token = NULL, oauth_expires_at = NULL WHERE id = ?1",
                    params![user_id.to_string()],
                )
                .map_err(|err| InfraError::from(err).0)?;
            Ok(())
        })
        .await
        .map_err(|err| SyncError::Internal(format!("blocking task join error: {err}")))?
    }
}
