//! Unified application error type.
//! All modules (db, core, sources, cli) return AppError so whole-pass
//! failures surface the same way. Per-record problems are not errors:
//! they travel as `core::gate::RejectReason` and end up in the summary.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Transport (transient)
    // ---------------------------
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    // ---------------------------
    // Sync pass setup
    // ---------------------------
    #[error("Sync is disabled")]
    SyncDisabled,

    #[error("Device is disabled: {0}")]
    DeviceDisabled(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Sync already running: {0}")]
    AlreadyRunning(String),

    #[error("Device not configured: {0}")]
    DeviceNotFound(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Network and device failures: the pass for that device aborts and the
    /// next scheduled run retries from the last checkpoint.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Http(_) | AppError::Api { .. } | AppError::DeviceUnavailable(_) | AppError::Io(_)
        )
    }
}

impl AppError {
    /// A UNIQUE or PRIMARY KEY constraint rejected a write.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Db(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
