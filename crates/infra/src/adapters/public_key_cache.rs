//! Concrete `PublicKeyCache` (C1): fetches and caches the portal's RSA
//! public key with a bounded TTL.
//!
//! Grounded in `pulsearc_common::auth::TokenManager`'s
//! `Arc<RwLock<Option<T>>>` pattern rather than a cache crate — this is a
//! single cached value with an expiry check, not a keyed cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pulsearc_domain::constants::PUBLIC_KEY_CACHE_TTL_SECS;
use pulsearc_domain::{SyncError, SyncResult};
use pulsearc_core::ports::PublicKeyCache;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

struct CachedKey {
    pem: Vec<u8>,
    fetched_at: Instant,
}

/// Fetches the portal's public key over HTTP, warming up the session first.
pub struct HttpPublicKeyCache {
    client: reqwest::Client,
    base_url: String,
    ttl: Duration,
    cached: Arc<RwLock<Option<CachedKey>>>,
}

impl HttpPublicKeyCache {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url,
            ttl: Duration::from_secs(PUBLIC_KEY_CACHE_TTL_SECS),
            cached: Arc::new(RwLock::new(None)),
        }
    }

    async fn fetch(&self) -> SyncResult<Vec<u8>> {
        // Warm-up: the portal only serves the public key to a session that
        // has first hit the login page.
        let warm_up_url = format!("{}/AOnline/auth", self.base_url);
        if let Err(err) = self.client.get(&warm_up_url).send().await {
            warn!(error = %err, "public key warm-up request failed");
            return Err(SyncError::Crypto(format!("warm-up request failed: {err}")));
        }

        let key_url = format!("{}/AOnline/config-properties/public-key", self.base_url);
        let response = self
            .client
            .get(&key_url)
            .send()
            .await
            .map_err(|err| SyncError::Crypto(format!("public key request failed: {err}")))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(SyncError::Crypto(format!(
                "public key endpoint returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SyncError::Crypto(format!("failed to read public key body: {err}")))?;

        Ok(body.into_bytes())
    }
}

#[async_trait]
impl PublicKeyCache for HttpPublicKeyCache {
    #[instrument(skip(self))]
    async fn get_public_key(&self) -> SyncResult<Vec<u8>> {
        {
            let guard = self.cached.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    debug!("returning cached public key");
                    return Ok(cached.pem.clone());
                }
            }
        }

        let pem = self.fetch().await?;

        let mut guard = self.cached.write().await;
        *guard = Some(CachedKey { pem: pem.clone(), fetched_at: Instant::now() });
        Ok(pem)
    }
}
