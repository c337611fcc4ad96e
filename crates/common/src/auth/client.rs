//! Google OAuth 2.0 confidential-client implementation
//!
//! Insper Sync runs as a server-side worker, not a desktop/mobile app, so it
//! authenticates against Google using the standard confidential-client
//! authorization-code flow (RFC 6749 §4.1) rather than PKCE: the client
//! secret travels in every token request instead of a code verifier.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server returned an error
    OAuthError(OAuthError),

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// Google OAuth 2.0 confidential client
///
/// Builds the consent URL with `access_type=offline&prompt=consent` so Google
/// always issues a refresh token, and includes `client_secret` on every token
/// request per RFC 6749 §4.1.3.
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl GoogleOAuthClient {
    /// Create a new Google OAuth client with the given configuration
    ///
    /// # Examples
    /// ```
    /// use pulsearc_common::auth::{GoogleOAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::confidential(
    ///     "accounts.google.com".to_string(),
    ///     "client_id".to_string(),
    ///     "client_secret".to_string(),
    ///     "http://localhost:3000/callback".to_string(),
    ///     vec!["https://www.googleapis.com/auth/calendar".to_string()],
    /// );
    /// let client = GoogleOAuthClient::new(config);
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let builder = Client::builder().timeout(std::time::Duration::from_secs(30));
        let builder = if std::env::var_os("INSPER_SYNC_DISABLE_PROXY").is_some() {
            builder.no_proxy()
        } else {
            builder
        };
        let client = builder.build().unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// Build the Google consent-screen URL
    ///
    /// `state` should be a per-request random token the caller persists and
    /// validates on the redirect callback.
    ///
    /// # Errors
    /// Returns an error if `client_id` is empty.
    pub async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        if self.config.client_id.is_empty() {
            return Err(OAuthClientError::ConfigError("client_id is empty".to_string()));
        }

        let state = uuid::Uuid::new_v4().to_string();
        let scope_string = self.config.scope_string();

        let params = [
            ("response_type", "code"),
            ("client_id", &self.config.client_id),
            ("redirect_uri", &self.config.redirect_uri),
            ("scope", &scope_string),
            ("state", &state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok((format!("{GOOGLE_AUTH_URL}?{query_string}"), state))
    }

    /// Exchange an authorization code for tokens
    ///
    /// `state` validation against the value returned by
    /// [`Self::generate_authorization_url`] is the caller's responsibility -
    /// this client is stateless between calls.
    ///
    /// # Errors
    /// Returns an error if the token endpoint rejects the exchange or the
    /// response cannot be parsed.
    pub async fn exchange_code_for_tokens(&self, code: &str) -> Result<TokenSet, OAuthClientError> {
        #[derive(Serialize)]
        struct TokenRequest<'a> {
            grant_type: &'a str,
            client_id: &'a str,
            client_secret: &'a str,
            code: &'a str,
            redirect_uri: &'a str,
        }

        let request_body = TokenRequest {
            grant_type: "authorization_code",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            code,
            redirect_uri: &self.config.redirect_uri,
        };

        let response = self.client.post(GOOGLE_TOKEN_URL).form(&request_body).send().await?;
        self.parse_token_response(response).await
    }

    /// Refresh an access token using a refresh token
    ///
    /// # Errors
    /// Returns `NoRefreshToken` if `refresh_token` is empty, or an error if
    /// the refresh request fails.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("client_id", self.config.client_id.as_str());
        params.insert("client_secret", self.config.client_secret.as_str());
        params.insert("refresh_token", refresh_token);

        let response = self.client.post(GOOGLE_TOKEN_URL).form(&params).send().await?;
        self.parse_token_response(response).await
    }

    async fn parse_token_response(
        &self,
        response: reqwest::Response,
    ) -> Result<TokenSet, OAuthClientError> {
        if !response.status().is_success() {
            let error: OAuthError =
                response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;
            return Err(OAuthClientError::OAuthError(error));
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        Ok(token_response.into())
    }

    /// Get the configured redirect URI
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl OAuthClientTrait for GoogleOAuthClient {
    async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        self.generate_authorization_url().await
    }

    async fn exchange_code_for_tokens(
        &self,
        code: &str,
        _state: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.exchange_code_for_tokens(code).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uri()
    }
}
