//! # Insper Sync Infrastructure
//!
//! Concrete adapter implementations of the `pulsearc-core` port traits.
//!
//! This crate contains:
//! - Configuration loading (env-first, file fallback)
//! - The SQLite-backed event store and user repository
//! - HTTP client adapters for the academic portal and Google Calendar
//! - The fleet-level cron scheduler
//!
//! ## Architecture
//! - Implements traits defined in `pulsearc-core`
//! - Depends on `pulsearc-common` and `pulsearc-core`
//! - Contains all "impure" code (I/O)

pub mod adapters;
pub mod config;
pub mod errors;
pub mod scheduling;

pub use config::*;
pub use errors::*;
pub use scheduling::{SchedulerError, SchedulerResult, SyncScheduler, SyncSchedulerConfig};
