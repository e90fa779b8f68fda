//! Supervisor error taxonomy.
//!
//! Validation, duplicate-name, config, wallet and abort errors are
//! raised before any state is touched. Spawn and start-up crash
//! errors are raised after the store has been rolled back.

use std::path::PathBuf;

use thiserror::Error;

/// Every failure a `pm` command can surface to the operator.
#[derive(Debug, Error)]
pub enum PmError {
    /// Bad process name, unknown strategy or other malformed input.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Which input was rejected.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// A live record already uses this name.
    #[error("a process named '{0}' is already running")]
    DuplicateName(String),

    /// No record (and for `logs`, no log file) exists for this name.
    #[error("no process named '{0}'")]
    NotFound(String),

    /// Strategy config file missing or not a JSON object.
    #[error("config {path}: {reason}")]
    Config {
        /// Path given on the command line.
        path: PathBuf,
        /// Why it could not be used.
        reason: String,
    },

    /// Wallet credentials unavailable or rejected.
    #[error("wallet: {0}")]
    Wallet(String),

    /// The operator declined a confirmation prompt.
    #[error("aborted, nothing was changed")]
    Aborted,

    /// The OS refused to create the worker process.
    #[error("failed to spawn worker for '{name}': {source}")]
    Spawn {
        /// Process name being started.
        name: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The worker died inside the start-up grace window.
    #[error("process '{name}' exited during start-up (see {log_file})")]
    ImmediateCrash {
        /// Process name being started.
        name: String,
        /// Log file of the crashed worker.
        log_file: PathBuf,
        /// Last lines of that log, oldest first.
        log_tail: Vec<String>,
    },

    /// A termination signal could not be delivered.
    #[error("could not signal pid {pid}: {reason}")]
    SignalDelivery {
        /// Target pid.
        pid: u32,
        /// OS error description.
        reason: String,
    },

    /// Store or log I/O failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PmError {
    /// Shorthand for a [`PmError::Validation`].
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
