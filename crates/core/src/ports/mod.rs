//! Port traits (C1-C8): the seams the reconciler and orchestrator depend on
//! instead of touching HTTP clients or storage directly.

pub mod academic;
pub mod auth;
pub mod calendar;
pub mod downstream;
pub mod oauth;
pub mod store;
pub mod user_repo;

pub use academic::{AcademicData, AcademicProfileFetcher};
pub use auth::{PasswordEncryptor, PortalIdentity, PortalSession, PublicKeyCache};
pub use calendar::{CalendarScraper, CalendarScraperFactory};
pub use downstream::{
    CalendarListEntry, DownstreamCalendarClient, DownstreamEventPayload, EventSource,
    ExtendedProperties,
};
pub use oauth::OAuthTokenManager;
pub use store::EventStore;
pub use user_repo::UserRepository;
