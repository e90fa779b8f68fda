//! Supervised process records.
//!
//! A `ProcessRecord` is the only thing that survives between two
//! `pm` invocations. Records are created by `start` and deleted by
//! `stop`/`kill`/`stop-all` or by stale-entry cleanup; they are never
//! edited in place.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::PmError;
use super::strategy::Strategy;

/// Current on-disk schema version of the process store.
pub const STORE_VERSION: u32 = 1;

/// Longest accepted process name.
pub const MAX_NAME_LEN: usize = 32;

/// Check a process name: 1 to 32 characters from `[A-Za-z0-9_-]`.
///
/// # Errors
/// Returns [`PmError::Validation`] describing the first violated rule.
pub fn validate_name(name: &str) -> Result<(), PmError> {
    if name.is_empty() {
        return Err(PmError::validation("name", "process name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(PmError::validation(
            "name",
            format!("'{name}' is longer than {MAX_NAME_LEN} characters"),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(PmError::validation(
            "name",
            format!("'{name}' contains '{bad}' (allowed: letters, digits, '_' and '-')"),
        ));
    }
    Ok(())
}

/// One supervised bot instance as persisted in the store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    /// Unique name chosen by the operator.
    pub name: String,
    /// OS pid of the worker.
    pub pid: u32,
    /// Strategy the worker runs.
    pub strategy: Strategy,
    /// Trading subaccount.
    pub account: String,
    /// Wallet label, display only.
    pub wallet: Option<String>,
    /// Strategy config, passed through untouched.
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Spawn time (Unix ms).
    pub started_at: i64,
    /// Combined stdout/stderr of the worker.
    pub log_file: PathBuf,
    /// Config file the worker was started with, reused by `restart`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
}

impl ProcessRecord {
    /// Milliseconds since spawn, clamped at zero for clock skew.
    pub fn uptime_ms(&self, now_ms: i64) -> u64 {
        u64::try_from(now_ms - self.started_at).unwrap_or(0)
    }
}

/// Full contents of the store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStore {
    /// Schema version tag.
    pub version: u32,
    /// Supervised processes, at most one per name.
    pub processes: Vec<ProcessRecord>,
}

impl Default for ProcessStore {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            processes: Vec::new(),
        }
    }
}

impl ProcessStore {
    /// Look up a record by name.
    pub fn find(&self, name: &str) -> Option<&ProcessRecord> {
        self.processes.iter().find(|p| p.name == name)
    }

    /// Whether a record with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Add a record, refusing a second record with the same name.
    ///
    /// # Errors
    /// Returns [`PmError::DuplicateName`] if the name is taken.
    pub fn insert(&mut self, record: ProcessRecord) -> Result<(), PmError> {
        if self.contains(&record.name) {
            return Err(PmError::DuplicateName(record.name));
        }
        self.processes.push(record);
        Ok(())
    }

    /// Remove and return the record with this name.
    pub fn remove(&mut self, name: &str) -> Option<ProcessRecord> {
        let idx = self.processes.iter().position(|p| p.name == name)?;
        Some(self.processes.remove(idx))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

/// A record plus liveness computed at inspection time. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    /// The persisted record.
    #[serde(flatten)]
    pub record: ProcessRecord,
    /// Whether the pid answered the liveness probe.
    pub running: bool,
    /// Time since spawn in milliseconds.
    #[serde(rename = "uptime")]
    pub uptime_ms: u64,
}

impl ProcessStatus {
    /// Derive a status for `record` at `now_ms`.
    pub fn new(record: ProcessRecord, running: bool, now_ms: i64) -> Self {
        let uptime_ms = record.uptime_ms(now_ms);
        Self {
            record,
            running,
            uptime_ms,
        }
    }
}
