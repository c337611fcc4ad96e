//! Domain data model: the six aggregates that make up the sync engine's
//! persisted state.

pub mod event;
pub mod mapping;
pub mod session;
pub mod sync_configuration;
pub mod user;

pub use event::{DownstreamEvent, UpstreamEvent};
pub use mapping::{EventMapping, MappingStatus, SyncDirection};
pub use session::{SessionStatus, SyncSession};
pub use sync_configuration::{SyncConfiguration, DEFAULT_GOOGLE_CALENDAR_NAME};
pub use user::User;
