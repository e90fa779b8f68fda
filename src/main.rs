//! dexbot - Entry Point
//!
//! Two kinds of invocation share this binary:
//! - `dexbot pm ...` is a short-lived supervisor command. It loads the
//!   process table, performs one operation and exits.
//! - `dexbot run ...` is the long-lived worker a `pm start` launches.
//!   It runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Resolve the home directory and load `dexbot.toml`
//! 2. Init tracing (stderr for `pm`, JSON on stdout for workers)
//! 3. Build adapters (JSON store, signals, launcher, log reader, wallet, prompt)
//! 4. Dispatch to the supervisor or the worker loop
//! 5. Print `Error: ...` and exit 1 on failure (usage errors included)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use dexbot::adapters::logs::FileLogReader;
use dexbot::adapters::os::{DetachedLauncher, SignalProcessControl};
use dexbot::adapters::persistence::JsonRecordStore;
use dexbot::adapters::terminal::TerminalPrompt;
use dexbot::adapters::wallet::EnvWallet;
use dexbot::cli::pm::PmView;
use dexbot::cli::{Cli, Command, PmCommand, RunArgs};
use dexbot::config::strategy::load_strategy_config;
use dexbot::config::{
    AppConfig, HomePaths, ensure_directories, load_settings, resolve_home, settings_source,
};
use dexbot::domain::strategy::Strategy;
use dexbot::ports::wallet::WalletService;
use dexbot::usecases::supervisor::{Supervisor, SupervisorPorts, SupervisorSettings};
use dexbot::usecases::worker::{WorkerSpec, run_worker};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; help and version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── 1. Home directory + settings ────────────────────────
    let home = resolve_home(cli.home.clone());
    let config =
        load_settings(&home, cli.settings.as_deref()).context("Failed to load settings")?;

    // ── 2. Tracing ──────────────────────────────────────────
    init_tracing(&cli, &config);
    match settings_source(&home, cli.settings.as_deref()) {
        Some(path) => info!(path = %path.display(), "Settings loaded"),
        None => debug!(home = %home.display(), "No settings file, using defaults"),
    }

    let paths = HomePaths::new(&home, &config);
    match cli.command {
        Command::Pm(command) => run_pm(command, &config, &paths).await,
        Command::Run(args) => run_worker_command(args, &config).await,
    }
}

/// Precedence: `--log-level` > `RUST_LOG` > settings > per-command default.
fn init_tracing(cli: &Cli, config: &AppConfig) {
    let default = if cli.is_worker() { "info" } else { "warn" };
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.log_level.as_deref().unwrap_or(default))
        }),
    };

    if cli.is_worker() {
        // Worker stdout is the per-process log file.
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

async fn run_pm(command: PmCommand, config: &AppConfig, paths: &HomePaths) -> Result<()> {
    // ── 3. Adapters ─────────────────────────────────────────
    ensure_directories(paths)?;

    let worker_program = match &config.pm.worker_program {
        Some(program) => program.clone(),
        None => std::env::current_exe().context("Failed to locate the dexbot executable")?,
    };

    let ports = SupervisorPorts {
        store: Arc::new(JsonRecordStore::new(&paths.store_file)),
        processes: Arc::new(SignalProcessControl),
        launcher: Arc::new(DetachedLauncher),
        logs: Arc::new(FileLogReader),
        wallet: Arc::new(EnvWallet::from_env(config.wallet.name.clone())),
        prompt: Arc::new(TerminalPrompt),
    };
    let settings = SupervisorSettings::from_config(&config.pm, paths, worker_program);
    let supervisor = Supervisor::new(ports, settings);

    // ── 4. Dispatch ─────────────────────────────────────────
    let view = PmView {
        log_lines: config.pm.log_lines,
        follow_poll: Duration::from_millis(config.pm.follow_poll_ms),
    };
    dexbot::cli::pm::execute(&supervisor, command, view).await
}

async fn run_worker_command(args: RunArgs, config: &AppConfig) -> Result<()> {
    if !args.yes {
        warn!("Worker started without --yes; workers never prompt");
    }

    let strategy: Strategy = args.strategy.parse()?;
    let strategy_config = match &args.config {
        Some(path) => Some(load_strategy_config(path).await?),
        None => None,
    };
    let wallet: Arc<dyn WalletService> =
        Arc::new(EnvWallet::from_env(config.wallet.name.clone()));

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        wait_for_shutdown().await;
        let _ = shutdown_tx.send(());
    });

    let spec = WorkerSpec {
        strategy,
        account: args.account,
        config: strategy_config,
        heartbeat: Duration::from_secs(config.worker.heartbeat_seconds),
    };
    run_worker(spec, wallet, shutdown_rx).await?;
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn wait_for_shutdown() {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM, waiting for SIGINT only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
        _ = terminate.recv() => info!("SIGTERM received, shutting down"),
    }
}
