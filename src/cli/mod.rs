//! Command line grammar.
//!
//! `dexbot pm ...` manages background bots; `dexbot run ...` is the
//! worker entry point the supervisor launches.

pub mod output;
pub mod pm;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::loader::HOME_ENV;

#[derive(Parser, Debug)]
#[command(version, about = "DEX trading desk CLI")]
pub struct Cli {
    /// State directory (process table, logs, settings)
    #[arg(long, env = HOME_ENV, global = true)]
    pub home: Option<PathBuf>,

    /// Settings file; defaults to <home>/dexbot.toml when present
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage bots running in the background
    #[command(subcommand)]
    Pm(PmCommand),
    /// Run a strategy in the foreground (used by `pm start`)
    Run(RunArgs),
}

#[derive(Subcommand, Debug)]
pub enum PmCommand {
    /// List supervised processes
    #[command(alias = "ls")]
    Ps {
        /// Print a JSON array instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Start a named bot in the background
    Start(StartArgs),
    /// Stop a bot (SIGTERM, then SIGKILL after the grace period)
    Stop {
        name: String,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Stop a bot and start it again with the same parameters
    Restart { name: String },
    /// Show the tail of a bot's log
    Logs {
        name: String,
        /// Keep printing new lines until Ctrl-C
        #[arg(long, short)]
        follow: bool,
        /// Number of lines to show
        #[arg(long, short = 'n')]
        lines: Option<usize>,
    },
    /// Kill a bot immediately (SIGKILL)
    Kill {
        name: String,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Stop every supervised bot
    StopAll {
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Unique process name ([A-Za-z0-9_-], at most 32 characters)
    pub name: String,
    /// Strategy to run (simple, grid, twap, dca, mm)
    pub strategy: String,
    /// JSON strategy config
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Trading account; overrides the config's `account`
    #[arg(long)]
    pub account: Option<String>,
    /// Do not ask for confirmation
    #[arg(long, short)]
    pub yes: bool,
    /// Never prompt; fail if the wallet is locked
    #[arg(long)]
    pub non_interactive: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Strategy to run
    pub strategy: String,
    /// Trading account
    #[arg(long)]
    pub account: String,
    /// JSON strategy config
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Accept without confirmation (workers never prompt)
    #[arg(long, short)]
    pub yes: bool,
}

impl Cli {
    /// Whether this invocation is a worker rather than a supervisor command.
    pub fn is_worker(&self) -> bool {
        matches!(self.command, Command::Run(_))
    }
}
