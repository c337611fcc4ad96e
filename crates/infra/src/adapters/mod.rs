//! Concrete adapters implementing the `pulsearc-core` port traits (C1-C8).

pub mod academic_profile;
pub mod calendar_scraper;
pub mod downstream_calendar;
pub mod oauth;
pub mod password_encryptor;
pub mod portal_session;
pub mod public_key_cache;
pub mod sqlite_store;

pub use academic_profile::PortalAcademicProfileFetcher;
pub use calendar_scraper::{HttpCalendarScraper, HttpCalendarScraperFactory};
pub use downstream_calendar::{default_downstream_client, GoogleCalendarClient};
pub use oauth::{GoogleOAuthSettings, GoogleOAuthTokenManager};
pub use password_encryptor::RsaPasswordEncryptor;
pub use portal_session::HttpPortalSession;
pub use public_key_cache::HttpPublicKeyCache;
pub use sqlite_store::{init_schema, SqliteEventStore, SqliteUserRepository};
