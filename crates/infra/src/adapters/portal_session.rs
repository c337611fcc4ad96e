//! Concrete `PortalSession` (C3): a cookie-bearing HTTP session against the
//! academic portal.
//!
//! `reqwest::Client`'s cookie store accumulates the `user-data` cookie set
//! on login and replays it on every subsequent `authed_get`. No
//! `User-Agent` header is set — the portal's load balancer has been
//! observed to reject requests that carry one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use pulsearc_core::ports::{PortalIdentity, PortalSession};
use pulsearc_domain::constants::{CONNECTION_TEST_TIMEOUT_SECS, PORTAL_REQUEST_TIMEOUT_SECS};
use pulsearc_domain::{SyncError, SyncResult};
use reqwest::{Client, Url};
use tracing::{instrument, warn};

/// Cookie-bearing session against the portal's base URL.
pub struct HttpPortalSession {
    client: Client,
    cookie_jar: Arc<reqwest::cookie::Jar>,
    base_url: Url,
}

impl HttpPortalSession {
    /// # Errors
    /// Returns `SyncError::Config` if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> SyncResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| SyncError::Config(format!("invalid portal base URL: {err}")))?;

        let cookie_jar = Arc::new(reqwest::cookie::Jar::default());
        let client = Client::builder()
            .cookie_provider(cookie_jar.clone())
            .timeout(Duration::from_secs(PORTAL_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| SyncError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { client, cookie_jar, base_url })
    }

    fn url(&self, path: &str) -> SyncResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| SyncError::InvalidInput(format!("invalid portal path {path}: {err}")))
    }

    fn user_data_cookie(&self) -> Option<String> {
        let header = self.cookie_jar.cookies(&self.base_url)?;
        let header_str = header.to_str().ok()?;
        header_str.split(';').map(str::trim).find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == "user-data").then(|| value.to_string())
        })
    }
}

#[async_trait]
impl PortalSession for HttpPortalSession {
    #[instrument(skip(self))]
    async fn test_connection(&self) -> SyncResult<bool> {
        let url = self.url("/AOnline/auth")?;
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(CONNECTION_TEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("portal connection test failed: {err}")))?;

        Ok(response.status() == reqwest::StatusCode::OK)
    }

    #[instrument(skip(self, ciphertext_password))]
    async fn login(&self, username: &str, ciphertext_password: &str) -> SyncResult<PortalIdentity> {
        let url = self.url("/AOnline/auth")?;
        let response = self
            .client
            .post(url)
            .header("content-type", "application/x-www-form-urlencoded")
            .form(&[("username", username), ("password", ciphertext_password)])
            .send()
            .await
            .map_err(|err| SyncError::Auth(format!("portal login request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(SyncError::Auth(format!("portal login returned status {}", response.status())));
        }

        let Some(user_data) = self.user_data_cookie() else {
            return Err(SyncError::Auth("portal login did not return a user-data cookie".to_string()));
        };

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(user_data.as_bytes())
            .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(user_data.as_bytes()))
            .map_err(|err| SyncError::Auth(format!("user-data cookie is not valid base64: {err}")))?;

        serde_json::from_slice(&decoded)
            .map_err(|err| SyncError::Auth(format!("user-data cookie is not valid JSON: {err}")))
    }

    #[instrument(skip(self))]
    async fn authed_get(&self, path: &str) -> SyncResult<String> {
        let url = self.url(path)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| SyncError::Connection(format!("authenticated portal request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            warn!(status = %response.status(), path, "authenticated portal request returned non-200");
            return Err(SyncError::Connection(format!(
                "portal request to {path} returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|err| SyncError::Connection(format!("failed to read portal response body: {err}")))
    }
}
