//! Concrete `OAuthTokenManager` (C6): wraps `pulsearc_common::auth`'s
//! confidential-client Google OAuth machinery, keyed per user instead of a
//! single system-keychain account.
//!
//! The teacher's calendar OAuth module (`integrations/calendar/oauth.rs`)
//! stores one account's tokens in the OS keychain via a loopback PKCE flow.
//! This synchroniser is a multi-tenant server-side worker: tokens live in the
//! `users` table (one row per portal account), and the interactive consent
//! step happens out of process (§6's external interfaces), so this adapter
//! builds a fresh `TokenManager` per user rather than holding one singleton.

use std::sync::Arc;

use async_trait::async_trait;
use pulsearc_common::auth::traits::KeychainTrait;
use pulsearc_common::auth::{GoogleOAuthClient, OAuthConfig, TokenManager, TokenSet};
use pulsearc_core::ports::{OAuthTokenManager, UserRepository};
use pulsearc_domain::{SyncError, SyncResult, User};

use crate::errors::InfraError;

/// Configuration needed to talk to Google's OAuth endpoints (§6: client id,
/// secret, redirect URI, scopes — provided by the layered configuration
/// loader, not hardcoded).
#[derive(Debug, Clone)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub refresh_threshold_seconds: i64,
}

impl GoogleOAuthSettings {
    fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig::confidential(
            "accounts.google.com".to_string(),
            self.client_id.clone(),
            self.client_secret.clone(),
            self.redirect_uri.clone(),
            self.scopes.clone(),
        )
    }
}

/// Adapts [`UserRepository`]'s OAuth columns to [`KeychainTrait`], so
/// `TokenManager` can treat a user's row as its credential store. `account`
/// is the user's UUID, stringified.
struct UserTokenKeychain {
    users: Arc<dyn UserRepository>,
}

#[async_trait]
impl KeychainTrait for UserTokenKeychain {
    async fn store_tokens(&self, account: &str, tokens: &TokenSet) -> Result<(), String> {
        let user_id = parse_account(account)?;
        let expires_at = tokens
            .expires_at
            .unwrap_or_else(|| chrono::Utc::now() + chrono::Duration::seconds(tokens.expires_in));

        self.users
            .update_oauth_tokens(
                user_id,
                &tokens.access_token,
                tokens.refresh_token.as_deref(),
                expires_at,
            )
            .await
            .map_err(|err| err.to_string())
    }

    async fn retrieve_tokens(&self, account: &str) -> Result<TokenSet, String> {
        let user_id = parse_account(account)?;
        let user = self
            .users
            .get_by_id(user_id)
            .await
            .map_err(|err| err.to_string())?
            .ok_or_else(|| "user not found".to_string())?;

        let access_token = user.oauth_access_token.ok_or("no stored access token")?;
        let expires_at = user.oauth_expires_at.ok_or("no stored token expiry")?;
        let expires_in = (expires_at - chrono::Utc::now()).num_seconds().max(0);

        let mut tokens = TokenSet::new(access_token, user.oauth_refresh_token, None, expires_in, None);
        tokens.expires_at = Some(expires_at);
        Ok(tokens)
    }

    async fn delete_tokens(&self, account: &str) -> Result<(), String> {
        let user_id = parse_account(account)?;
        self.users.clear_oauth_tokens(user_id).await.map_err(|err| err.to_string())
    }

    async fn has_tokens(&self, account: &str) -> bool {
        let Ok(user_id) = parse_account(account) else { return false };
        matches!(self.users.get_by_id(user_id).await, Ok(Some(user)) if user.oauth_access_token.is_some())
    }
}

fn parse_account(account: &str) -> Result<uuid::Uuid, String> {
    account.parse().map_err(|_| format!("invalid account id: {account}"))
}

pub struct GoogleOAuthTokenManager {
    settings: GoogleOAuthSettings,
    users: Arc<dyn UserRepository>,
}

impl GoogleOAuthTokenManager {
    #[must_use]
    pub fn new(settings: GoogleOAuthSettings, users: Arc<dyn UserRepository>) -> Self {
        Self { settings, users }
    }

    fn token_manager_for(&self, user: &User) -> TokenManager<GoogleOAuthClient, UserTokenKeychain> {
        let oauth_client = GoogleOAuthClient::new(self.settings.oauth_config());
        let keychain = Arc::new(UserTokenKeychain { users: self.users.clone() });
        TokenManager::new(
            oauth_client,
            keychain,
            user.id.to_string(),
            self.settings.refresh_threshold_seconds,
        )
    }
}

#[async_trait]
impl OAuthTokenManager for GoogleOAuthTokenManager {
    async fn get_valid_access_token(&self, user: &User) -> SyncResult<String> {
        if user.oauth_refresh_token.is_none() {
            return Err(SyncError::Auth(format!("user {} has no OAuth refresh token", user.id)));
        }

        let manager = self.token_manager_for(user);
        manager.initialize().await.map_err(|err| SyncError::Auth(err.to_string()))?;
        manager.get_access_token().await.map_err(|err| SyncError::Auth(err.to_string()))
    }

    async fn get_authorization_url(&self) -> SyncResult<(String, String)> {
        let oauth_client = GoogleOAuthClient::new(self.settings.oauth_config());
        oauth_client
            .generate_authorization_url()
            .await
            .map_err(|err| SyncError::Auth(err.to_string()))
    }

    async fn exchange_code(&self, code: &str, _state: &str) -> SyncResult<TokenSet> {
        // State/CSRF validation is the caller's responsibility (§6: the
        // out-of-scope presentation layer owns the interactive consent
        // round-trip and its own session state), mirroring how
        // `GoogleOAuthClient`'s own `OAuthClientTrait` impl treats `state` as
        // informational only.
        let oauth_client = GoogleOAuthClient::new(self.settings.oauth_config());
        oauth_client
            .exchange_code_for_tokens(code)
            .await
            .map_err(|err| SyncError::Auth(err.to_string()))
    }
}
