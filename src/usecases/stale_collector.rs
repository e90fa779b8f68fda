//! Stale Entry Collector - Prune Records Whose Process Is Gone
//!
//! Runs before every command so that `ps` never shows a dead bot and
//! the name of a crashed bot can be reused right away.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::error::PmError;
use crate::domain::process::ProcessStore;
use crate::ports::process::ProcessControl;
use crate::ports::record_store::RecordStore;

/// Drops records whose pid no longer answers the liveness probe.
pub struct StaleEntryCollector {
  store: Arc<dyn RecordStore>,
  processes: Arc<dyn ProcessControl>,
}

impl StaleEntryCollector {
  /// Create a collector over the given store and process handle.
  pub fn new(store: Arc<dyn RecordStore>, processes: Arc<dyn ProcessControl>) -> Self {
    Self { store, processes }
  }

  /// Remove dead entries from `store`.
  ///
  /// The pruned table is persisted only if something was removed.
  ///
  /// # Errors
  /// Returns an error if the pruned table cannot be saved.
  #[instrument(skip_all, fields(records = store.len()))]
  pub async fn cleanup(&self, mut store: ProcessStore) -> Result<ProcessStore, PmError> {
    let before = store.len();
    store.processes.retain(|record| {
      let alive = self.processes.is_alive(record.pid);
      if !alive {
        info!(name = %record.name, pid = record.pid, "Pruning stale process record");
      }
      alive
    });

    if store.len() != before {
      self.store.save(&store).await?;
    }
    Ok(store)
  }

  /// Load the table and prune it in one step.
  ///
  /// # Errors
  /// Returns an error if the pruned table cannot be saved.
  pub async fn load_live(&self) -> Result<ProcessStore, PmError> {
    let store = self.store.load().await;
    self.cleanup(store).await
  }
}
