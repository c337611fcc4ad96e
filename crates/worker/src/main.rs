//! Entry point for the Insper Sync worker: a long-running process that
//! drives the fleet-level cron jobs (`SyncScheduler`) until asked to stop.
//!
//! Wiring follows the same shape as the desktop application's `AppContext`:
//! load configuration, open the database, build every adapter, assemble the
//! orchestrator, then hand control to the scheduler until a shutdown signal
//! arrives.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pulsearc_common::storage::pool::{SqlitePool, SqlitePoolConfig};
use pulsearc_core::orchestrator::SyncOrchestrator;
use pulsearc_core::ports::{CalendarScraperFactory, DownstreamCalendarClient, EventStore, OAuthTokenManager, UserRepository};
use pulsearc_core::reconcile::Reconciler;
use pulsearc_infra::adapters::{
    default_downstream_client, init_schema, GoogleOAuthSettings, GoogleOAuthTokenManager,
    HttpCalendarScraperFactory, SqliteEventStore, SqliteUserRepository,
};
use pulsearc_infra::config::{self, WorkerConfig};
use pulsearc_infra::{SyncScheduler, SyncSchedulerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("insper_sync_worker=info".parse()?))
        .init();

    let config = config::load().context("failed to load worker configuration")?;
    tracing::info!(db_path = %config.database.path, "starting insper sync worker");

    let pool = open_pool(&config).context("failed to open database pool")?;
    init_schema(&pool).context("failed to initialize database schema")?;
    let pool = Arc::new(pool);

    let users: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool.clone()));
    let store: Arc<dyn EventStore> = Arc::new(SqliteEventStore::new(pool));
    let scrapers: Arc<dyn CalendarScraperFactory> =
        Arc::new(HttpCalendarScraperFactory::new(config.portal.base_url.clone()));
    let oauth: Arc<dyn OAuthTokenManager> = Arc::new(GoogleOAuthTokenManager::new(
        GoogleOAuthSettings {
            client_id: config.google.client_id.clone(),
            client_secret: config.google.client_secret.clone(),
            redirect_uri: config.google.redirect_uri.clone(),
            scopes: config.google.scopes.clone(),
            refresh_threshold_seconds: 300,
        },
        users.clone(),
    ));
    let downstream: Arc<dyn DownstreamCalendarClient> = Arc::new(default_downstream_client());

    let reconciler = Reconciler::new(store.clone(), downstream.clone(), config.portal.base_url.clone());
    let orchestrator =
        Arc::new(SyncOrchestrator::new(users, store, scrapers, oauth, downstream, reconciler));

    let scheduler_config = SyncSchedulerConfig {
        sync_cron_expression: config.schedule.cron_expression.clone(),
        ..SyncSchedulerConfig::default()
    };
    let mut scheduler = SyncScheduler::new(orchestrator, scheduler_config);
    scheduler.start().await.context("failed to start sync scheduler")?;

    tracing::info!("worker running, waiting for shutdown signal");
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;

    tracing::info!("shutdown signal received, stopping scheduler");
    scheduler.stop().await.context("failed to stop sync scheduler cleanly")?;

    Ok(())
}

fn open_pool(config: &WorkerConfig) -> anyhow::Result<SqlitePool> {
    let pool_config = SqlitePoolConfig {
        max_size: config.database.pool_size,
        connection_timeout: Duration::from_secs(5),
        busy_timeout: Duration::from_millis(5000),
        enable_wal: true,
        enable_foreign_keys: true,
    };

    if config.database.path == ":memory:" {
        return SqlitePool::in_memory(pool_config).context("failed to open in-memory database");
    }

    SqlitePool::new(Path::new(&config.database.path), pool_config)
        .with_context(|| format!("failed to open database at {}", config.database.path))
}
