//! Configuration loader.
//!
//! ## Loading Strategy
//! 1. Attempts to load from environment variables first
//! 2. If incomplete, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `INSPER_SYNC_DB_PATH`: SQLite database file path
//! - `INSPER_SYNC_DB_POOL_SIZE`: Connection pool size
//! - `INSPER_SYNC_PORTAL_BASE_URL`: Academic portal base URL
//! - `INSPER_SYNC_GOOGLE_CLIENT_ID`: Google OAuth client id
//! - `INSPER_SYNC_GOOGLE_CLIENT_SECRET`: Google OAuth client secret
//! - `INSPER_SYNC_SCHEDULE_CRON`: Cron expression for the fleet sync job
//! - `INSPER_SYNC_DEFAULT_CALENDAR_NAME`: Default downstream calendar name
//!
//! ## File Locations
//! The loader probes the following paths, in order:
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./insper-sync.json` or `./insper-sync.toml`
//! 3. `../config.{json,toml}`, `../../config.{json,toml}`
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use pulsearc_domain::{SyncError, SyncResult, DEFAULT_GOOGLE_CALENDAR_NAME};
use serde::{Deserialize, Serialize};

/// Top-level worker configuration, assembled from the environment or a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub database: DatabaseConfig,
    pub portal: PortalConfig,
    pub google: GoogleConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/calendar".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_cron")]
    pub cron_expression: String,
    #[serde(default = "default_calendar_name")]
    pub default_calendar_name: String,
}

fn default_cron() -> String {
    "0 */15 * * * *".to_string()
}

fn default_calendar_name() -> String {
    DEFAULT_GOOGLE_CALENDAR_NAME.to_string()
}

/// Load configuration with automatic fallback: environment first, then file.
///
/// # Errors
/// Returns `SyncError::Config` if neither source yields a complete
/// configuration.
pub fn load() -> SyncResult<WorkerConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(err) => {
            tracing::debug!(error = ?err, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration strictly from environment variables.
///
/// # Errors
/// Returns `SyncError::Config` if a required variable is missing or fails
/// to parse.
pub fn load_from_env() -> SyncResult<WorkerConfig> {
    let db_path = env_var("INSPER_SYNC_DB_PATH")?;
    let db_pool_size = env_var("INSPER_SYNC_DB_POOL_SIZE")
        .and_then(|s| s.parse::<u32>().map_err(|e| SyncError::Config(format!("invalid pool size: {e}"))))?;

    let portal_base_url = env_var("INSPER_SYNC_PORTAL_BASE_URL")?;

    let google_client_id = env_var("INSPER_SYNC_GOOGLE_CLIENT_ID")?;
    let google_client_secret = env_var("INSPER_SYNC_GOOGLE_CLIENT_SECRET")?;
    let google_redirect_uri = env_var("INSPER_SYNC_GOOGLE_REDIRECT_URI")?;

    let cron_expression =
        std::env::var("INSPER_SYNC_SCHEDULE_CRON").unwrap_or_else(|_| default_cron());
    let default_calendar_name = std::env::var("INSPER_SYNC_DEFAULT_CALENDAR_NAME")
        .unwrap_or_else(|_| default_calendar_name());

    Ok(WorkerConfig {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        portal: PortalConfig { base_url: portal_base_url },
        google: GoogleConfig {
            client_id: google_client_id,
            client_secret: google_client_secret,
            redirect_uri: google_redirect_uri,
            scopes: default_scopes(),
        },
        schedule: ScheduleConfig { cron_expression, default_calendar_name },
    })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes multiple locations via [`probe_config_paths`].
///
/// # Errors
/// Returns `SyncError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> SyncResult<WorkerConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!("config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config("no config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> SyncResult<WorkerConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("invalid JSON format: {e}"))),
        other => Err(SyncError::Config(format!("unsupported config format: {other}"))),
    }
}

/// Probe standard locations for a config file.
///
/// Returns the first candidate path that exists, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("insper-sync.json"),
            cwd.join("insper-sync.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("insper-sync.json"),
                exe_dir.join("insper-sync.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> SyncResult<String> {
    std::env::var(key)
        .map_err(|_| SyncError::Config(format!("missing required environment variable: {key}")))
}
