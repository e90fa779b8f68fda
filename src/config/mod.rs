//! Configuration Module - TOML-based Settings
//!
//! Loads optional operator settings from `dexbot.toml` in the home
//! directory. Every field has a default, so a missing file is the
//! same as an empty one. Strategy configs are separate JSON files
//! handed to workers untouched (see `strategy`).

pub mod loader;
pub mod strategy;

use std::path::PathBuf;

use serde::Deserialize;

pub use loader::{HomePaths, ensure_directories, load_settings, resolve_home, settings_source};

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Log level override (trace, debug, info, warn, error).
  #[serde(default)]
  pub log_level: Option<String>,
  /// Process supervisor settings.
  #[serde(default)]
  pub pm: PmConfig,
  /// Wallet display settings.
  #[serde(default)]
  pub wallet: WalletConfig,
  /// Worker (`run`) settings.
  #[serde(default)]
  pub worker: WorkerConfig,
}

/// Process supervisor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PmConfig {
  /// Account used when neither `--account` nor the config names one.
  #[serde(default = "default_account")]
  pub default_account: String,
  /// Wait after spawning before checking for an immediate crash (ms).
  #[serde(default = "default_start_grace")]
  pub start_grace_ms: u64,
  /// Wait after SIGTERM before escalating to SIGKILL (ms).
  #[serde(default = "default_stop_grace")]
  pub stop_grace_ms: u64,
  /// Pause between the stop and start halves of a restart (ms).
  #[serde(default = "default_restart_pause")]
  pub restart_pause_ms: u64,
  /// Lines shown by `pm logs` without `--lines`.
  #[serde(default = "default_log_lines")]
  pub log_lines: usize,
  /// Log lines shown when a worker crashes during start-up.
  #[serde(default = "default_crash_tail")]
  pub crash_tail_lines: usize,
  /// Poll interval of `pm logs --follow` (ms).
  #[serde(default = "default_follow_poll")]
  pub follow_poll_ms: u64,
  /// Worker executable; defaults to the running binary.
  pub worker_program: Option<PathBuf>,
  /// Log directory; defaults to `<home>/logs`.
  pub log_dir: Option<PathBuf>,
}

impl Default for PmConfig {
  fn default() -> Self {
    Self {
      default_account: default_account(),
      start_grace_ms: default_start_grace(),
      stop_grace_ms: default_stop_grace(),
      restart_pause_ms: default_restart_pause(),
      log_lines: default_log_lines(),
      crash_tail_lines: default_crash_tail(),
      follow_poll_ms: default_follow_poll(),
      worker_program: None,
      log_dir: None,
    }
  }
}

/// Wallet configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
  /// Label shown in `pm ps` instead of the signer address.
  pub name: Option<String>,
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
  /// Heartbeat log interval (seconds).
  #[serde(default = "default_heartbeat")]
  pub heartbeat_seconds: u64,
}

impl Default for WorkerConfig {
  fn default() -> Self {
    Self {
      heartbeat_seconds: default_heartbeat(),
    }
  }
}

// Default value functions for serde

fn default_account() -> String {
  "main".to_string()
}

fn default_start_grace() -> u64 {
  2_000
}

fn default_stop_grace() -> u64 {
  3_000
}

fn default_restart_pause() -> u64 {
  1_000
}

fn default_log_lines() -> usize {
  50
}

fn default_crash_tail() -> usize {
  20
}

fn default_follow_poll() -> u64 {
  250
}

fn default_heartbeat() -> u64 {
  30
}
