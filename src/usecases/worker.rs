//! Worker Use Case - The `run` Entry Point of a Supervised Bot
//!
//! This is what the supervisor launches. It never prompts: the wallet
//! must already be unlocked through the forwarded environment. The
//! trading strategy itself plugs in elsewhere; the worker owns the
//! lifecycle around it and keeps a heartbeat in the log so `pm logs`
//! shows the bot is alive.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::strategy::StrategyConfig;
use crate::domain::error::PmError;
use crate::domain::strategy::Strategy;
use crate::ports::wallet::WalletService;

/// What a worker was asked to run.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
  pub strategy: Strategy,
  pub account: String,
  pub config: Option<StrategyConfig>,
  /// Interval between heartbeat log lines.
  pub heartbeat: Duration,
}

/// Summary of a finished worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
  /// Heartbeats logged before shutdown.
  pub heartbeats: u64,
}

/// Run until a shutdown signal arrives.
///
/// # Errors
/// Returns [`PmError::Wallet`] if no signing credentials are available.
pub async fn run_worker(
  spec: WorkerSpec,
  wallet: Arc<dyn WalletService>,
  mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<WorkerSummary, PmError> {
  if !wallet.is_unlocked().await {
    return Err(PmError::Wallet(
      "no credentials in the environment; workers cannot prompt".to_string(),
    ));
  }

  let label = wallet.label().await;
  info!(
    strategy = %spec.strategy,
    account = %spec.account,
    wallet = label.as_deref().unwrap_or("-"),
    config = %config_label(spec.config.as_ref()),
    settings = spec.config.as_ref().map_or(0, |c| c.values.len()),
    pid = std::process::id(),
    "Worker started"
  );

  let mut summary = WorkerSummary { heartbeats: 0 };
  let mut ticker = tokio::time::interval(spec.heartbeat);
  // The first tick completes immediately.
  ticker.tick().await;

  loop {
    tokio::select! {
      biased;
      received = shutdown_rx.recv() => {
        if let Err(e) = received {
          warn!(error = %e, "Shutdown channel closed");
        }
        info!("Worker received shutdown signal");
        break;
      }
      _ = ticker.tick() => {
        summary.heartbeats += 1;
        info!(
          strategy = %spec.strategy,
          account = %spec.account,
          heartbeats = summary.heartbeats,
          "Worker heartbeat"
        );
      }
    }
  }

  info!(heartbeats = summary.heartbeats, "Worker stopped cleanly");
  Ok(summary)
}

/// Config path for log fields, `-` when running on defaults.
fn config_label(config: Option<&StrategyConfig>) -> String {
  config.map_or_else(|| "-".to_string(), |c| c.path.display().to_string())
}
