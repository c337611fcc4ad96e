//! Port interface for OAuth token lifecycle management (C6).
//!
//! Token storage and HTTP refresh mechanics already live in
//! `pulsearc-common::auth` (confidential-client Google OAuth, keychain
//! persistence); this port is the thin seam the reconciler and orchestrator
//! depend on so they never touch an HTTP client directly.

use async_trait::async_trait;
use pulsearc_common::auth::TokenSet;
use pulsearc_domain::{SyncResult, User};

#[async_trait]
pub trait OAuthTokenManager: Send + Sync {
    /// Return a valid bearer access token for `user`.
    ///
    /// Contract: fails with `SyncError::Auth` if the user has no refresh
    /// token. If the stored access token's expiry is strictly in the
    /// future, it is returned unchanged. Otherwise the refresh token is
    /// exchanged for a new access token; on success the new expiry (and new
    /// refresh token, if the provider issued one) is persisted. On failure
    /// the provider's error is surfaced without clobbering stored state.
    async fn get_valid_access_token(&self, user: &User) -> SyncResult<String>;

    /// Build the one-time interactive consent URL, paired with the opaque
    /// state value the caller must round-trip back to `exchange_code`.
    /// Invoked by the out-of-scope presentation layer, not by the sync
    /// loop — the token manager owns it because it shares OAuth client
    /// configuration.
    async fn get_authorization_url(&self) -> SyncResult<(String, String)>;

    /// Exchange an authorization code for the initial token set.
    async fn exchange_code(&self, code: &str, state: &str) -> SyncResult<TokenSet>;
}
