//! Record Store - Atomic JSON Process Table
//!
//! Saves the process table to `processes.json` using atomic writes
//! (write to tmp file, then rename), so a reader never observes a
//! half-written table. There is no lock: concurrent invocations race
//! and the last writer wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::domain::process::{ProcessStore, STORE_VERSION};
use crate::ports::record_store::RecordStore;

/// JSON-file implementation of [`RecordStore`].
pub struct JsonRecordStore {
    /// Path to processes.json.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl JsonRecordStore {
    /// Create a store backed by `path`. Nothing is touched until `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        Self {
            path,
            tmp_path: PathBuf::from(tmp),
        }
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> ProcessStore {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No process store yet, starting empty");
                return ProcessStore::default();
            }
            Err(e) => {
                warn!(error = %e, "Unreadable process store, treating as empty");
                return ProcessStore::default();
            }
        };

        match serde_json::from_str::<ProcessStore>(&json) {
            Ok(store) if store.version == STORE_VERSION => {
                debug!(processes = store.len(), "Process store loaded");
                store
            }
            Ok(store) => {
                warn!(
                    found = store.version,
                    expected = STORE_VERSION,
                    "Unsupported process store version, treating as empty"
                );
                ProcessStore::default()
            }
            Err(e) => {
                warn!(error = %e, "Corrupt process store, treating as empty");
                ProcessStore::default()
            }
        }
    }

    #[instrument(skip(self, store), fields(path = %self.path.display(), processes = store.len()))]
    async fn save(&self, store: &ProcessStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create state directory")?;
        }

        let json = serde_json::to_string_pretty(store)
            .context("Failed to serialize process store")?;

        // Write to tmp file
        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp process store")?;

        // Atomic rename
        fs::rename(&self.tmp_path, &self.path)
            .await
            .context("Failed to rename process store")?;

        debug!("Process store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::process::ProcessRecord;
    use crate::domain::strategy::Strategy;

    fn record(name: &str) -> ProcessRecord {
        ProcessRecord {
            name: name.to_string(),
            pid: 321,
            strategy: Strategy::Simple,
            account: "main".to_string(),
            wallet: Some("ops".to_string()),
            config: serde_json::Map::new(),
            started_at: 1_700_000_000_000,
            log_file: PathBuf::from("/tmp/x.log"),
            config_path: Some(PathBuf::from("/tmp/simple.json")),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path().join("processes.json"));
        assert_eq!(store.load().await, ProcessStore::default());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path().join("nested/state/processes.json"));

        let mut table = ProcessStore::default();
        table.insert(record("alpha")).unwrap();
        store.save(&table).await.unwrap();

        assert_eq!(store.load().await, table);
        assert!(!dir.path().join("nested/state/processes.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path().join("processes.json"));

        let mut table = ProcessStore::default();
        table.insert(record("alpha")).unwrap();
        table.insert(record("beta")).unwrap();
        store.save(&table).await.unwrap();

        table.remove("alpha");
        store.save(&table).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("beta"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processes.json");
        std::fs::write(&path, "{\"version\": 1, \"processes\": [{\"name\": ").unwrap();

        let store = JsonRecordStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_version_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processes.json");
        std::fs::write(&path, r#"{"version": 99, "processes": []}"#).unwrap();

        let loaded = JsonRecordStore::new(&path).load().await;
        assert_eq!(loaded.version, STORE_VERSION);
        assert!(loaded.is_empty());
    }
}
