//! Supervisor Use Case - Start, Stop and Inspect Background Bots
//!
//! Every operation follows the same shape: load the process table,
//! prune dead entries, do one thing, save. Nothing is kept in memory
//! between invocations; the store file and the OS process table are
//! the only shared state.
//!
//! Operations:
//! - `ps`: Live records with fresh status and uptime
//! - `start`: Validate, spawn detached, persist, watch the grace window
//! - `stop`: SIGTERM, grace period, SIGKILL escalation
//! - `restart`: Stop then start with the recorded parameters
//! - `kill`: Immediate SIGKILL
//! - `stop_all`: SIGTERM everything and clear the table
//! - `logs`: Tail of a worker's log file

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::config::strategy::{StrategyConfig, load_strategy_config, resolve_account};
use crate::config::{HomePaths, PmConfig};
use crate::domain::error::PmError;
use crate::domain::process::{ProcessRecord, ProcessStatus, validate_name};
use crate::domain::strategy::Strategy;
use crate::ports::launcher::{Launcher, WorkerCommand};
use crate::ports::logs::{LogReader, LogTail};
use crate::ports::process::{ProcessControl, TermSignal};
use crate::ports::prompt::Prompt;
use crate::ports::record_store::RecordStore;
use crate::ports::wallet::WalletService;
use crate::usecases::stale_collector::StaleEntryCollector;

/// Interval of the exit poll while waiting out the stop grace period.
const EXIT_POLL: Duration = Duration::from_millis(100);

/// Outside-world handles the supervisor works through.
#[derive(Clone)]
pub struct SupervisorPorts {
  pub store: Arc<dyn RecordStore>,
  pub processes: Arc<dyn ProcessControl>,
  pub launcher: Arc<dyn Launcher>,
  pub logs: Arc<dyn LogReader>,
  pub wallet: Arc<dyn WalletService>,
  pub prompt: Arc<dyn Prompt>,
}

/// Timing and layout knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
  /// Directory holding `<name>.log` files.
  pub log_dir: PathBuf,
  /// Executable implementing the `run` entry point.
  pub worker_program: PathBuf,
  /// Account used when neither the flag nor the config names one.
  pub default_account: String,
  /// Wait before the post-spawn liveness check.
  pub start_grace: Duration,
  /// Wait between SIGTERM and SIGKILL.
  pub stop_grace: Duration,
  /// Pause between the two halves of a restart.
  pub restart_pause: Duration,
  /// Log lines attached to an immediate-crash error.
  pub crash_tail_lines: usize,
}

impl SupervisorSettings {
  /// Derive settings from the loaded configuration.
  pub fn from_config(pm: &PmConfig, paths: &HomePaths, worker_program: PathBuf) -> Self {
    Self {
      log_dir: paths.log_dir.clone(),
      worker_program,
      default_account: pm.default_account.clone(),
      start_grace: Duration::from_millis(pm.start_grace_ms),
      stop_grace: Duration::from_millis(pm.stop_grace_ms),
      restart_pause: Duration::from_millis(pm.restart_pause_ms),
      crash_tail_lines: pm.crash_tail_lines,
    }
  }
}

/// Parameters of `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartRequest {
  /// Unique process name.
  pub name: String,
  /// Strategy identifier, validated against the known set.
  pub strategy: String,
  /// Optional JSON config handed to the worker.
  pub config_path: Option<PathBuf>,
  /// Explicit account; wins over the config's `account`.
  pub account: Option<String>,
  /// Skip the confirmation prompt.
  pub yes: bool,
  /// Never prompt; a locked wallet is an error.
  pub non_interactive: bool,
}

/// Result of `stop`.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
  /// No record under that name; nothing was done.
  NotRunning,
  /// The record pointed at a dead process and was dropped.
  DroppedStale(ProcessRecord),
  /// The process was signalled and its record removed.
  Terminated {
    record: ProcessRecord,
    /// Whether SIGKILL was needed after the grace period.
    forced: bool,
  },
}

/// Result of `kill`.
#[derive(Debug, Clone, PartialEq)]
pub struct KillOutcome {
  pub record: ProcessRecord,
  /// Whether SIGKILL was delivered (false if the process was already gone).
  pub signalled: bool,
}

/// Result of `stop_all`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopAllOutcome {
  /// Names that received SIGTERM.
  pub signalled: Vec<String>,
  /// Names whose signal failed, with the reason.
  pub failed: Vec<(String, String)>,
}

/// Result of `logs`.
#[derive(Debug, Clone, PartialEq)]
pub enum LogsView {
  /// The process is known but has not written anything yet.
  NoLogsYet(PathBuf),
  /// Trailing lines of the log file.
  Lines { path: PathBuf, tail: LogTail },
}

/// The `pm` command implementations.
pub struct Supervisor {
  ports: SupervisorPorts,
  settings: SupervisorSettings,
  collector: StaleEntryCollector,
}

impl Supervisor {
  /// Wire a supervisor from its ports and settings.
  pub fn new(ports: SupervisorPorts, settings: SupervisorSettings) -> Self {
    let collector =
      StaleEntryCollector::new(Arc::clone(&ports.store), Arc::clone(&ports.processes));
    Self {
      ports,
      settings,
      collector,
    }
  }

  /// Default log file location for `name`.
  pub fn log_path(&self, name: &str) -> PathBuf {
    self.settings.log_dir.join(format!("{name}.log"))
  }

  /// Live processes with freshly computed status.
  ///
  /// # Errors
  /// Returns an error if pruning stale entries fails to persist.
  #[instrument(skip(self))]
  pub async fn ps(&self) -> Result<Vec<ProcessStatus>, PmError> {
    let store = self.collector.load_live().await?;
    let now = Utc::now().timestamp_millis();

    Ok(
      store
        .processes
        .into_iter()
        .map(|record| {
          let running = self.ports.processes.is_alive(record.pid);
          ProcessStatus::new(record, running, now)
        })
        .collect(),
    )
  }

  /// Start a named worker in the background.
  ///
  /// Returns the persisted record once the worker has survived the
  /// start-up grace period.
  ///
  /// # Errors
  /// - [`PmError::Validation`] for a bad name or unknown strategy
  /// - [`PmError::DuplicateName`] if a live process has this name
  /// - [`PmError::Config`] if the config file is unusable
  /// - [`PmError::Wallet`] if credentials are unavailable
  /// - [`PmError::Aborted`] if the operator declines
  /// - [`PmError::Spawn`] if the OS refuses the spawn
  /// - [`PmError::ImmediateCrash`] if the worker dies during start-up
  #[instrument(skip(self, request), fields(name = %request.name, strategy = %request.strategy))]
  pub async fn start(&self, request: StartRequest) -> Result<ProcessRecord, PmError> {
    validate_name(&request.name)?;
    let strategy: Strategy = request.strategy.parse()?;

    let mut store = self.collector.load_live().await?;
    if store.contains(&request.name) {
      return Err(PmError::DuplicateName(request.name));
    }

    let config = match &request.config_path {
      Some(path) => Some(load_strategy_config(path).await?),
      None => None,
    };
    let account = resolve_account(
      request.account.as_deref(),
      config.as_ref(),
      &self.settings.default_account,
    );

    let child_env = self.ensure_wallet(request.non_interactive).await?;
    let wallet = self.ports.wallet.label().await;

    if !request.yes {
      let plan = start_plan(&request.name, strategy, &account, config.as_ref());
      if request.non_interactive || !self.ports.prompt.confirm(&plan) {
        return Err(PmError::Aborted);
      }
    }

    tokio::fs::create_dir_all(&self.settings.log_dir)
      .await
      .with_context(|| {
        format!(
          "Failed to create log directory {}",
          self.settings.log_dir.display()
        )
      })?;
    let log_file = self.log_path(&request.name);

    let config_path = config.as_ref().map(|c| c.path.clone());
    let command = WorkerCommand::run_strategy(
      &self.settings.worker_program,
      strategy,
      &account,
      config_path.as_deref(),
    )
    .with_env(child_env);

    let mut child = self
      .ports
      .launcher
      .launch(&command, &log_file)
      .map_err(|source| PmError::Spawn {
        name: request.name.clone(),
        source,
      })?;
    let pid = child.pid();

    let record = ProcessRecord {
      name: request.name.clone(),
      pid,
      strategy,
      account,
      wallet,
      config: config.map(|c| c.values).unwrap_or_default(),
      started_at: Utc::now().timestamp_millis(),
      log_file: log_file.clone(),
      config_path,
    };
    store.insert(record.clone())?;
    if let Err(e) = self.ports.store.save(&store).await {
      // An unrecorded worker could never be stopped through `pm`.
      warn!(pid, error = %e, "Saving the record failed, killing the new worker");
      if let Err(kill_err) = self.ports.processes.terminate(pid, TermSignal::Forceful) {
        warn!(pid, error = %kill_err, "Could not kill unrecorded worker");
      }
      return Err(e.into());
    }
    info!(pid, log = %log_file.display(), "Process record saved");

    tokio::time::sleep(self.settings.start_grace).await;

    if child.has_exited() || !self.ports.processes.is_alive(pid) {
      warn!(pid, "Worker exited during start-up grace period");
      store.remove(&request.name);
      self.ports.store.save(&store).await?;

      let log_tail = self.crash_tail(&log_file).await;
      return Err(PmError::ImmediateCrash {
        name: request.name,
        log_file,
        log_tail,
      });
    }

    info!(pid, "Worker running");
    Ok(record)
  }

  /// Stop a process gracefully, escalating to SIGKILL after the grace period.
  ///
  /// An unknown name is not an error.
  ///
  /// # Errors
  /// Returns [`PmError::Validation`] for a bad name, [`PmError::Aborted`]
  /// if the operator declines, or a store error.
  #[instrument(skip(self))]
  pub async fn stop(&self, name: &str, yes: bool) -> Result<StopOutcome, PmError> {
    validate_name(name)?;
    let mut store = self.collector.load_live().await?;

    let Some(record) = store.find(name).cloned() else {
      debug!("No such process, nothing to stop");
      return Ok(StopOutcome::NotRunning);
    };

    if !self.ports.processes.is_alive(record.pid) {
      store.remove(name);
      self.ports.store.save(&store).await?;
      return Ok(StopOutcome::DroppedStale(record));
    }

    if !yes
      && !self
        .ports
        .prompt
        .confirm(&format!("Stop '{name}' (pid {})?", record.pid))
    {
      return Err(PmError::Aborted);
    }

    if let Err(e) = self.ports.processes.terminate(record.pid, TermSignal::Graceful) {
      warn!(error = %e, "SIGTERM failed");
    }

    let mut forced = false;
    if !self.wait_for_exit(record.pid, self.settings.stop_grace).await {
      warn!(pid = record.pid, "Still alive after grace period, sending SIGKILL");
      forced = true;
      if let Err(e) = self.ports.processes.terminate(record.pid, TermSignal::Forceful) {
        warn!(error = %e, "SIGKILL failed");
      }
    }

    store.remove(name);
    self.ports.store.save(&store).await?;
    info!(pid = record.pid, forced, "Process stopped");

    Ok(StopOutcome::Terminated { record, forced })
  }

  /// Stop and start again with the recorded strategy, account and config.
  ///
  /// A failed start leaves the process stopped.
  ///
  /// # Errors
  /// Returns [`PmError::NotFound`] if no live record exists, or any
  /// error from the stop or start halves.
  #[instrument(skip(self))]
  pub async fn restart(&self, name: &str) -> Result<ProcessRecord, PmError> {
    validate_name(name)?;
    let store = self.collector.load_live().await?;
    let record = store
      .find(name)
      .cloned()
      .ok_or_else(|| PmError::NotFound(name.to_string()))?;

    self.stop(name, true).await?;
    tokio::time::sleep(self.settings.restart_pause).await;

    self
      .start(StartRequest {
        name: record.name,
        strategy: record.strategy.to_string(),
        config_path: record.config_path,
        account: Some(record.account),
        yes: true,
        non_interactive: false,
      })
      .await
  }

  /// SIGKILL a process immediately and forget it.
  ///
  /// # Errors
  /// Returns [`PmError::NotFound`] if no live record exists,
  /// [`PmError::Aborted`] if the operator declines, or a store error.
  #[instrument(skip(self))]
  pub async fn kill(&self, name: &str, yes: bool) -> Result<KillOutcome, PmError> {
    validate_name(name)?;
    let mut store = self.collector.load_live().await?;
    let record = store
      .find(name)
      .cloned()
      .ok_or_else(|| PmError::NotFound(name.to_string()))?;

    if !yes
      && !self
        .ports
        .prompt
        .confirm(&format!("Kill '{name}' (pid {}) immediately?", record.pid))
    {
      return Err(PmError::Aborted);
    }

    let mut signalled = false;
    if self.ports.processes.is_alive(record.pid) {
      match self.ports.processes.terminate(record.pid, TermSignal::Forceful) {
        Ok(()) => signalled = true,
        Err(e) => warn!(error = %e, "SIGKILL failed"),
      }
    }

    store.remove(name);
    self.ports.store.save(&store).await?;
    info!(pid = record.pid, signalled, "Process killed");

    Ok(KillOutcome { record, signalled })
  }

  /// SIGTERM every supervised process and clear the table.
  ///
  /// # Errors
  /// Returns [`PmError::Aborted`] if the operator declines, or a store error.
  #[instrument(skip(self))]
  pub async fn stop_all(&self, yes: bool) -> Result<StopAllOutcome, PmError> {
    let mut store = self.collector.load_live().await?;
    if store.is_empty() {
      return Ok(StopAllOutcome::default());
    }

    if !yes
      && !self
        .ports
        .prompt
        .confirm(&format!("Stop all {} processes?", store.len()))
    {
      return Err(PmError::Aborted);
    }

    let mut outcome = StopAllOutcome::default();
    for record in &store.processes {
      match self.ports.processes.terminate(record.pid, TermSignal::Graceful) {
        Ok(()) => outcome.signalled.push(record.name.clone()),
        Err(e) => {
          warn!(name = %record.name, error = %e, "SIGTERM failed");
          outcome.failed.push((record.name.clone(), e.to_string()));
        }
      }
    }

    store.processes.clear();
    self.ports.store.save(&store).await?;
    info!(
      signalled = outcome.signalled.len(),
      failed = outcome.failed.len(),
      "All processes stopped"
    );

    Ok(outcome)
  }

  /// Last `lines` lines of a process log.
  ///
  /// The log of a process that is no longer supervised stays readable.
  ///
  /// # Errors
  /// Returns [`PmError::NotFound`] if there is neither a record nor a
  /// log file for `name`.
  #[instrument(skip(self))]
  pub async fn logs(&self, name: &str, lines: usize) -> Result<LogsView, PmError> {
    validate_name(name)?;
    let store = self.collector.load_live().await?;
    let record = store.find(name);
    let path = record.map_or_else(|| self.log_path(name), |r| r.log_file.clone());

    let tail = self
      .ports
      .logs
      .tail(&path, lines)
      .await
      .with_context(|| format!("Failed to read {}", path.display()))?;

    match (tail, record) {
      (Some(tail), _) => Ok(LogsView::Lines { path, tail }),
      (None, Some(_)) => Ok(LogsView::NoLogsYet(path)),
      (None, None) => Err(PmError::NotFound(name.to_string())),
    }
  }

  /// Make sure the wallet can sign and return the child's credentials.
  async fn ensure_wallet(&self, non_interactive: bool) -> Result<Vec<(String, String)>, PmError> {
    let wallet = &self.ports.wallet;
    if !wallet.is_unlocked().await {
      if non_interactive {
        return Err(PmError::Wallet(
          "wallet is locked; set DEXBOT_PRIVATE_KEY or run interactively".to_string(),
        ));
      }
      let secret = self
        .ports
        .prompt
        .secret("Private key: ")
        .map_err(|e| PmError::Wallet(format!("{e:#}")))?;
      wallet
        .unlock(&secret)
        .await
        .map_err(|e| PmError::Wallet(format!("{e:#}")))?;
    }
    Ok(wallet.child_env().await)
  }

  /// Wait up to `grace` for `pid` to disappear. Returns whether it did.
  async fn wait_for_exit(&self, pid: u32, grace: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
      if !self.ports.processes.is_alive(pid) {
        return true;
      }
      let now = tokio::time::Instant::now();
      if now >= deadline {
        return false;
      }
      tokio::time::sleep(EXIT_POLL.min(deadline - now)).await;
    }
  }

  async fn crash_tail(&self, log_file: &Path) -> Vec<String> {
    match self
      .ports
      .logs
      .tail(log_file, self.settings.crash_tail_lines)
      .await
    {
      Ok(Some(tail)) => tail.lines,
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(error = %e, "Could not read crash log");
        Vec::new()
      }
    }
  }
}

/// Confirmation text describing a start.
fn start_plan(
  name: &str,
  strategy: Strategy,
  account: &str,
  config: Option<&StrategyConfig>,
) -> String {
  let config = config.map_or_else(|| "none".to_string(), |c| c.path.display().to_string());
  format!("Start '{name}': strategy {strategy}, account {account}, config {config}. Proceed?")
}
