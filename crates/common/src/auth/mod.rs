//! OAuth 2.0 confidential-client infrastructure
//!
//! Provides the OAuth token lifecycle used to authenticate Insper Sync
//! against Google Calendar: a confidential-client HTTP flow plus a
//! storage-agnostic token manager that handles proactive refresh.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   TokenManager    │  Generic over OAuthClientTrait + KeychainTrait
//! └─────────┬─────────┘
//!           │
//!           ├──► GoogleOAuthClient   (HTTP token exchange/refresh)
//!           │
//!           └──► KeychainTrait impl  (credential storage, e.g. the event store)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: Core OAuth types (`TokenSet`, `OAuthConfig`, `OAuthError`)
//! - **[`client`]**: `GoogleOAuthClient`, the confidential-client HTTP flow
//! - **[`token_manager`]**: Token lifecycle management with auto-refresh
//! - **[`traits`]**: `OAuthClientTrait` / `KeychainTrait` seams

pub mod client;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use client::{GoogleOAuthClient, OAuthClientError};
pub use token_manager::{TokenManager, TokenManagerError};
pub use traits::{KeychainTrait, OAuthClientTrait};
pub use types::{KeychainError, OAuthConfig, OAuthError, TokenResponse, TokenSet};
