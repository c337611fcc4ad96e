//! Background job scheduling (§10.5's fleet-level cron jobs).
//!
//! Explicit lifecycle management (start/stop), tracked join handles, and
//! cancellation-token-based shutdown, mirroring the rest of this crate's
//! adapters.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{SyncScheduler, SyncSchedulerConfig};
