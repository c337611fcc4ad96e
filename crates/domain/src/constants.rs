//! Domain-level constants
//!
//! Centralized location for constants that encode contractual values from the
//! upstream portal and downstream calendar provider. These are not
//! configuration (see `pulsearc-infra`'s config loader) — they are fixed
//! facts about the external systems this crate talks to.

/// TTL for the cached portal RSA public key.
pub const PUBLIC_KEY_CACHE_TTL_SECS: u64 = 3600;

/// Timeout for lightweight connection-test GETs against the portal.
pub const CONNECTION_TEST_TIMEOUT_SECS: u64 = 10;

/// Timeout for data-bearing GETs against the portal (profile, events).
pub const PORTAL_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default window (minutes) used to detect an already-running sync for a
/// user; a second sync is rejected while one is running within this window.
pub const RECENT_SESSION_WINDOW_MINUTES: i64 = 30;

/// Number of automatic retries the orchestrator attempts before giving up on
/// a user's sync.
pub const SYNC_MAX_RETRIES: u32 = 3;

/// Fixed delay between orchestrator retry attempts.
pub const SYNC_RETRY_DELAY_SECS: u64 = 60;

/// Age (days) beyond which completed sync sessions are purged by the
/// fleet-level cleanup job.
pub const SESSION_RETENTION_DAYS: i64 = 30;

/// Extended property key marking a downstream event as owned by this
/// synchroniser. Any event lacking this marker is invisible to the
/// reconciler.
pub const SYNC_SOURCE_MARKER: &str = "insper";

/// Literal used when the upstream event's location field is absent.
pub const UNKNOWN_LOCATION: &str = "NÃO INFORMADA";

/// Timezone all upstream/downstream timestamps are localised to before
/// persistence and before being sent to the downstream calendar API.
pub const SYNC_TIMEZONE: &str = "America/Sao_Paulo";

/// Maximum page size requested from the downstream calendar's `listEvents`.
pub const DOWNSTREAM_LIST_MAX_RESULTS: u32 = 2500;

/// Page size requested from the upstream portal's monthly events endpoint.
pub const UPSTREAM_EVENTS_PAGE_SIZE: u32 = 1000;
