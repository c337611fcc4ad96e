//! The sync orchestrator (C10): the per-user job that drives C3-C9 end to
//! end and owns the retry/concurrency contract around it.

mod range;
mod service;

pub use service::{SyncOrchestrator, SyncOutcome};
