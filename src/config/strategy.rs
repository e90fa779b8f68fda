//! Strategy Config Files - JSON Objects Passed Through to Workers
//!
//! The supervisor does not interpret strategy settings beyond the
//! optional `account` key. The file only has to exist and hold a
//! JSON object.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::domain::error::PmError;

/// A loaded strategy config.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
  /// Absolute path of the file, so later restarts work from any cwd.
  pub path: PathBuf,
  /// Parsed contents.
  pub values: Map<String, Value>,
}

impl StrategyConfig {
  /// Account named by the config, if any.
  pub fn account(&self) -> Option<&str> {
    self
      .values
      .get("account")
      .and_then(Value::as_str)
      .filter(|a| !a.trim().is_empty())
  }
}

/// Read and parse a strategy config file.
///
/// # Errors
/// Returns [`PmError::Config`] if the file is missing, unreadable,
/// not valid JSON, or not a JSON object.
pub async fn load_strategy_config(path: &Path) -> Result<StrategyConfig, PmError> {
  let config_error = |reason: String| PmError::Config {
    path: path.to_path_buf(),
    reason,
  };

  let content = tokio::fs::read_to_string(path)
    .await
    .map_err(|e| config_error(format!("cannot read file: {e}")))?;

  let value: Value = serde_json::from_str(&content)
    .map_err(|e| config_error(format!("invalid JSON: {e}")))?;

  let Value::Object(values) = value else {
    return Err(config_error("expected a JSON object".to_string()));
  };

  let path = tokio::fs::canonicalize(path)
    .await
    .map_err(|e| config_error(format!("cannot resolve path: {e}")))?;

  Ok(StrategyConfig { path, values })
}

/// Pick the account: explicit flag > config `account` > default.
pub fn resolve_account(
  explicit: Option<&str>,
  config: Option<&StrategyConfig>,
  default: &str,
) -> String {
  explicit
    .filter(|a| !a.trim().is_empty())
    .or_else(|| config.and_then(StrategyConfig::account))
    .unwrap_or(default)
    .to_string()
}
