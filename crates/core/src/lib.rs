//! # PulseArc Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Domain re-exports (`pulsearc-domain`)
//! - Port/adapter interfaces (traits) for every external seam (C1-C8)
//! - The reconciler (C9) and sync orchestrator (C10) services
//!
//! ## Architecture Principles
//! - Only depends on `pulsearc-common` and `pulsearc-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod orchestrator;
pub mod ports;
pub mod reconcile;

pub use orchestrator::{SyncOrchestrator, SyncOutcome};
pub use ports::{
    AcademicData, AcademicProfileFetcher, CalendarListEntry, CalendarScraper,
    CalendarScraperFactory, DownstreamCalendarClient, DownstreamEventPayload, EventSource,
    EventStore, ExtendedProperties, OAuthTokenManager, PasswordEncryptor, PortalIdentity,
    PortalSession, PublicKeyCache, UserRepository,
};
pub use reconcile::{Reconciler, ReconcileStats};
