//! Port interfaces for the portal's authentication handshake: public-key
//! caching (C1), password encryption (C2), and the cookie-bearing session
//! (C3).

use async_trait::async_trait;
use pulsearc_domain::SyncResult;

/// Fetches and caches the portal's RSA public key with a bounded TTL.
///
/// The cache is process-wide, read-mostly, single-writer on miss — a
/// racing double-fetch on concurrent misses is acceptable, since both
/// writers produce the same bytes.
#[async_trait]
pub trait PublicKeyCache: Send + Sync {
    /// Return the PEM-encoded RSA public key, fetching and populating the
    /// cache on miss. An HTTP non-200 response surfaces as
    /// `SyncError::Crypto` and does NOT populate the cache.
    async fn get_public_key(&self) -> SyncResult<Vec<u8>>;
}

/// Encrypts a plaintext password under the cached portal public key.
#[async_trait]
pub trait PasswordEncryptor: Send + Sync {
    /// RSA-encrypt `plaintext` with PKCS#1 v1.5 padding under the current
    /// public key, base64-encode the ciphertext with the standard alphabet,
    /// and return it as ASCII.
    async fn encrypt_password(&self, plaintext: &str) -> SyncResult<String>;
}

/// The portal's identity payload, decoded from the `user-data` cookie set on
/// a successful login.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PortalIdentity {
    pub id: String,
    pub name: String,
    pub login: String,
    pub roles: Vec<String>,
    pub root: Option<String>,
    pub theme: Option<String>,
    /// Sentinel field that is semantically boolean but textually
    /// `"true"`/`"false"` in the upstream payload.
    #[serde(rename = "senhaAlterada")]
    pub senha_alterada: String,
}

/// A cookie-bearing HTTP session against the portal.
#[async_trait]
pub trait PortalSession: Send + Sync {
    /// GET the portal login page. Success iff status 200.
    async fn test_connection(&self) -> SyncResult<bool>;

    /// POST the form-encoded login. Success requires both HTTP 200 and a
    /// `user-data` cookie in the response; on success the decoded identity
    /// is returned and the session's cookie jar retains the authenticated
    /// state for subsequent `authed_get` calls.
    async fn login(&self, username: &str, ciphertext_password: &str) -> SyncResult<PortalIdentity>;

    /// Issue an authenticated GET against `path` using the accumulated
    /// cookie jar.
    async fn authed_get(&self, path: &str) -> SyncResult<String>;
}
