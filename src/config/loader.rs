//! Configuration Loader - Settings File, Home Directory and Paths
//!
//! Resolves where state lives, loads `dexbot.toml` if present, and
//! creates the state/log directories on demand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::AppConfig;

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "DEXBOT_HOME";

/// Settings file name inside the home directory.
pub const SETTINGS_FILE: &str = "dexbot.toml";

/// Store file name inside the home directory.
pub const STORE_FILE: &str = "processes.json";

/// Resolve the home directory: explicit flag > `DEXBOT_HOME` > `~/.dexbot`.
pub fn resolve_home(explicit: Option<PathBuf>) -> PathBuf {
  if let Some(home) = explicit {
    return home;
  }
  if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
    return PathBuf::from(home);
  }
  std::env::var_os("HOME")
    .map_or_else(|| PathBuf::from("."), PathBuf::from)
    .join(".dexbot")
}

/// Filesystem layout derived from the home directory and settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomePaths {
  /// Root state directory.
  pub home: PathBuf,
  /// JSON process table.
  pub store_file: PathBuf,
  /// Per-process log directory.
  pub log_dir: PathBuf,
}

impl HomePaths {
  /// Derive the layout for `home`, honouring a configured log directory.
  pub fn new(home: &Path, config: &AppConfig) -> Self {
    Self {
      home: home.to_path_buf(),
      store_file: home.join(STORE_FILE),
      log_dir: config
        .pm
        .log_dir
        .clone()
        .unwrap_or_else(|| home.join("logs")),
    }
  }
}

/// Create the home and log directories. Idempotent.
///
/// # Errors
/// Returns an error if a directory cannot be created.
pub fn ensure_directories(paths: &HomePaths) -> Result<()> {
  for dir in [&paths.home, &paths.log_dir] {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("Failed to create directory {}", dir.display()))?;
  }
  debug!(home = %paths.home.display(), logs = %paths.log_dir.display(), "Directories ready");
  Ok(())
}

/// Settings file in effect: `explicit` if given, else
/// `<home>/dexbot.toml` when it exists.
pub fn settings_source(home: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
  match explicit {
    Some(path) => Some(path.to_path_buf()),
    None => Some(home.join(SETTINGS_FILE)).filter(|path| path.exists()),
  }
}

/// Load and validate settings.
///
/// With `explicit` set the file must exist. Otherwise
/// `<home>/dexbot.toml` is used when present and defaults apply when
/// it is not.
///
/// # Errors
/// Returns detailed error if:
/// - An explicitly named file doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_settings(home: &Path, explicit: Option<&Path>) -> Result<AppConfig> {
  let Some(path) = settings_source(home, explicit) else {
    return Ok(AppConfig::default());
  };

  let content = std::fs::read_to_string(&path)
    .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| format!("Failed to parse {}", path.display()))?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate settings values.
fn validate_config(config: &AppConfig) -> Result<()> {
  let pm = &config.pm;

  anyhow::ensure!(
    !pm.default_account.trim().is_empty(),
    "pm.default_account must not be empty"
  );
  anyhow::ensure!(
    pm.start_grace_ms <= 60_000,
    "pm.start_grace_ms must be at most 60000, got {}",
    pm.start_grace_ms
  );
  anyhow::ensure!(
    pm.stop_grace_ms <= 60_000,
    "pm.stop_grace_ms must be at most 60000, got {}",
    pm.stop_grace_ms
  );
  anyhow::ensure!(pm.log_lines > 0, "pm.log_lines must be positive");
  anyhow::ensure!(pm.follow_poll_ms > 0, "pm.follow_poll_ms must be positive");
  anyhow::ensure!(
    config.worker.heartbeat_seconds > 0,
    "worker.heartbeat_seconds must be positive"
  );

  Ok(())
}
