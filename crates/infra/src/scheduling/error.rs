//! Scheduler error types.

use std::time::Duration;

use pulsearc_domain::SyncError;
use thiserror::Error;

use crate::errors::InfraError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler already running")]
    AlreadyRunning,

    #[error("scheduler not running")]
    NotRunning,

    #[error("failed to create scheduler: {source}")]
    CreationFailed { source: tokio_cron_scheduler::JobSchedulerError },

    #[error("failed to start scheduler: {source}")]
    StartFailed { source: tokio_cron_scheduler::JobSchedulerError },

    #[error("failed to stop scheduler: {source}")]
    StopFailed { source: tokio_cron_scheduler::JobSchedulerError },

    #[error("failed to register job: {source}")]
    JobRegistrationFailed { source: tokio_cron_scheduler::JobSchedulerError },

    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration, source: tokio::time::error::Elapsed },

    #[error("task join failed: {source}")]
    TaskJoinFailed { source: tokio::task::JoinError },
}

impl From<tokio::task::JoinError> for SchedulerError {
    fn from(source: tokio::task::JoinError) -> Self {
        SchedulerError::TaskJoinFailed { source }
    }
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                InfraError(SyncError::InvalidInput(err.to_string()))
            }
            other => InfraError(SyncError::Internal(other.to_string())),
        }
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
