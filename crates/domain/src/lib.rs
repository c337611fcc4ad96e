//! # Insper Sync Domain
//!
//! Pure domain types and models for the Insper calendar synchroniser.
//!
//! This crate contains:
//! - The data model (User, UpstreamEvent, DownstreamEvent, EventMapping,
//!   SyncSession, SyncConfiguration)
//! - The domain error taxonomy and `SyncResult` alias
//! - Free-text field extraction helpers used by the calendar scraper
//! - Domain constants describing fixed facts about the upstream portal and
//!   downstream calendar provider
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

pub use errors::*;
pub use types::*;
