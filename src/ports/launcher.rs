//! Launcher Port - Detached Worker Spawning
//!
//! Workers are started through an explicit entry-point contract:
//!
//! ```text
//! <program> run <strategy> --account <account> [--config <path>] --yes
//! ```
//!
//! Any program honouring that command line can be supervised.

use std::path::{Path, PathBuf};

use crate::domain::strategy::Strategy;

/// Full description of a worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
  /// Executable to launch.
  pub program: PathBuf,
  /// Arguments after the program name.
  pub args: Vec<String>,
  /// Extra environment variables for the child.
  pub env: Vec<(String, String)>,
}

impl WorkerCommand {
  /// Build the `run` entry-point invocation for a strategy.
  pub fn run_strategy(
    program: &Path,
    strategy: Strategy,
    account: &str,
    config_path: Option<&Path>,
  ) -> Self {
    let mut args = vec![
      "run".to_string(),
      strategy.to_string(),
      "--account".to_string(),
      account.to_string(),
    ];
    if let Some(path) = config_path {
      args.push("--config".to_string());
      args.push(path.display().to_string());
    }
    args.push("--yes".to_string());

    Self {
      program: program.to_path_buf(),
      args,
      env: Vec::new(),
    }
  }

  /// Attach environment variables (e.g. forwarded credentials).
  pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
    self.env.extend(env);
    self
  }
}

/// Handle to a freshly launched worker.
///
/// Dropping the handle never waits for or kills the worker.
pub trait SpawnedProcess: Send {
  /// OS pid of the worker.
  fn pid(&self) -> u32;

  /// Whether the worker has already exited (reaping it if so).
  fn has_exited(&mut self) -> bool;
}

/// Starts workers detached from the caller's lifetime.
pub trait Launcher: Send + Sync + 'static {
  /// Spawn `command` with stdout/stderr appended to `log_file`.
  ///
  /// Returns as soon as the OS has assigned a pid.
  fn launch(
    &self,
    command: &WorkerCommand,
    log_file: &Path,
  ) -> std::io::Result<Box<dyn SpawnedProcess>>;
}
