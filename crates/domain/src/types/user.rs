//! User aggregate: portal credentials, OAuth tokens, and the capability
//! flags that gate whether a sync may run at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;
use uuid::Uuid;

/// A synchroniser user: one portal account paired with one downstream
/// calendar.
///
/// Invariant: the reconciler refuses to run unless `email_verified`,
/// `portal_credentials_configured`, `downstream_connected`, and `active` are
/// all true.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct User {
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub id: Uuid,

    pub email: String,

    /// Portal (SGA) login username. Distinct from `email` — students log
    /// into the portal with their matriculation-derived username.
    pub portal_username: Option<String>,

    /// RSA-encrypted, base64-encoded portal password. Never stored or
    /// logged in plaintext.
    pub portal_password_ciphertext: Option<String>,

    pub oauth_access_token: Option<String>,
    pub oauth_refresh_token: Option<String>,

    #[cfg_attr(feature = "ts-gen", ts(type = "string", optional))]
    pub oauth_expires_at: Option<DateTime<Utc>>,

    /// Downstream calendar id found or created by `findOrCreateSyncCalendar`.
    pub downstream_calendar_id: Option<String>,

    pub email_verified: bool,
    pub portal_credentials_configured: bool,
    pub downstream_connected: bool,
    pub active: bool,

    #[cfg_attr(feature = "ts-gen", ts(type = "string", optional))]
    pub last_sync: Option<DateTime<Utc>>,
}

impl User {
    /// All four capability flags gating a sync run.
    #[must_use]
    pub fn is_sync_eligible(&self) -> bool {
        self.email_verified
            && self.portal_credentials_configured
            && self.downstream_connected
            && self.active
    }

    /// True iff the stored OAuth access token's expiry is strictly in the
    /// future (the "return it unchanged" branch of C6's contract).
    #[must_use]
    pub fn has_valid_access_token(&self, now: DateTime<Utc>) -> bool {
        matches!(self.oauth_expires_at, Some(expiry) if expiry > now)
    }
}
