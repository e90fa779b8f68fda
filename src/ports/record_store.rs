//! Record Store Port - Durable Process Table
//!
//! The store is the only state shared between two `pm` invocations.
//! It is read whole and written whole; there is no partial update.

use async_trait::async_trait;

use crate::domain::process::ProcessStore;

/// Repository for the supervised process table.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
  /// Load the table.
  ///
  /// A missing or unparsable file yields an empty store of the
  /// current version. This never fails.
  async fn load(&self) -> ProcessStore;

  /// Overwrite the table with `store`, creating parent directories.
  async fn save(&self, store: &ProcessStore) -> anyhow::Result<()>;
}
