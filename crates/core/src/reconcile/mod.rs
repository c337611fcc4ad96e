//! The reconciler (C9): diffs upstream events against the downstream
//! events this synchroniser owns and applies the delta.

pub(crate) mod convert;
mod format;
mod service;

pub use service::{ReconcileStats, Reconciler};
