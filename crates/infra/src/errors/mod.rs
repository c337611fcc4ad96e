//! Conversions from external infrastructure errors into [`SyncError`].

mod conversions;

pub use conversions::InfraError;
