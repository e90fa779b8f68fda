//! Log Reader Port - Per-process Log Files

use std::path::Path;

use async_trait::async_trait;

/// Last lines of a log file and where reading stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTail {
  /// Up to N trailing lines, oldest first.
  pub lines: Vec<String>,
  /// File length at read time; follow mode continues from here.
  pub end_offset: u64,
}

/// Read access to worker log files.
#[async_trait]
pub trait LogReader: Send + Sync + 'static {
  /// Last `lines` lines of `path`, or `None` if the file does not exist.
  async fn tail(&self, path: &Path, lines: usize) -> std::io::Result<Option<LogTail>>;
}
