//! Fleet-level cron scheduler (§10.5): periodically drives
//! `SyncOrchestrator::sync_all_users` and `cleanup_old_sync_sessions`.
//!
//! Join handles are tracked and cancellation is explicit, following the
//! lifecycle shape of the teacher's calendar scheduler: `start`/`stop` are
//! idempotent-safe, every phase has its own timeout, and the monitor task
//! exits as soon as the cancellation token fires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pulsearc_core::orchestrator::SyncOrchestrator;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Cron expression for `sync_all_users` (default: every 15 minutes).
    pub sync_cron_expression: String,
    /// Cron expression for `cleanup_old_sync_sessions` (default: daily at 03:00).
    pub cleanup_cron_expression: String,
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            sync_cron_expression: "0 */15 * * * *".into(),
            cleanup_cron_expression: "0 0 3 * * *".into(),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Owns the `tokio_cron_scheduler::JobScheduler` instance and registers the
/// fleet-level sync and cleanup jobs against it.
pub struct SyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    orchestrator: Arc<SyncOrchestrator>,
}

impl SyncScheduler {
    #[must_use]
    pub fn new(orchestrator: Arc<SyncOrchestrator>, config: SyncSchedulerConfig) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            orchestrator,
        }
    }

    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            cancel.cancelled().await;
            debug!("sync scheduler monitor cancelled");
        });

        self.monitor_handle = Some(handle);
        info!("sync scheduler started");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = self.scheduler.take().ok_or(SchedulerError::NotRunning)?;
        let stop_timeout = self.config.stop_timeout;

        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
            .map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })?
                .map_err(SchedulerError::from)?;
        }

        info!("sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;

        let sync_job = {
            let orchestrator = self.orchestrator.clone();
            let job_timeout = self.config.job_timeout;
            Job::new_async(self.config.sync_cron_expression.as_str(), move |_id, _lock| {
                let orchestrator = orchestrator.clone();
                Box::pin(async move {
                    let started = Instant::now();
                    match tokio::time::timeout(job_timeout, orchestrator.sync_all_users()).await {
                        Ok(Ok(outcomes)) => {
                            info!(
                                users = outcomes.len(),
                                elapsed_ms = started.elapsed().as_millis(),
                                "fleet sync completed"
                            );
                        }
                        Ok(Err(err)) => error!(error = ?err, "fleet sync failed"),
                        Err(_) => warn!(timeout_secs = job_timeout.as_secs(), "fleet sync timed out"),
                    }
                })
            })
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?
        };
        scheduler
            .add(sync_job)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let cleanup_job = {
            let orchestrator = self.orchestrator.clone();
            let job_timeout = self.config.job_timeout;
            Job::new_async(self.config.cleanup_cron_expression.as_str(), move |_id, _lock| {
                let orchestrator = orchestrator.clone();
                Box::pin(async move {
                    match tokio::time::timeout(job_timeout, orchestrator.cleanup_old_sync_sessions())
                        .await
                    {
                        Ok(Ok(removed)) => info!(removed, "stale sync session cleanup completed"),
                        Ok(Err(err)) => error!(error = ?err, "sync session cleanup failed"),
                        Err(_) => warn!(timeout_secs = job_timeout.as_secs(), "cleanup timed out"),
                    }
                })
            })
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?
        };
        scheduler
            .add(cleanup_job)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(
            sync_cron = %self.config.sync_cron_expression,
            cleanup_cron = %self.config.cleanup_cron_expression,
            "registered fleet sync jobs"
        );
        Ok(scheduler)
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
