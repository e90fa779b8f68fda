//! `pm` subcommands: run the supervisor operation and report.
//!
//! Every command says what it is about to do on stderr and prints
//! the result on stdout.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;

use super::PmCommand;
use super::output::{render_json, render_table};
use crate::adapters::logs::follow_lines;
use crate::domain::error::PmError;
use crate::usecases::supervisor::{LogsView, StartRequest, StopOutcome, Supervisor};

/// Presentation settings for `pm`.
#[derive(Debug, Clone, Copy)]
pub struct PmView {
    /// Lines shown by `logs` without `--lines`.
    pub log_lines: usize,
    /// Poll interval of `logs --follow`.
    pub follow_poll: Duration,
}

/// Execute one `pm` subcommand.
///
/// # Errors
/// Returns the supervisor's error; an immediate crash prints the log
/// tail first.
pub async fn execute(supervisor: &Supervisor, command: PmCommand, view: PmView) -> Result<()> {
    match command {
        PmCommand::Ps { json } => {
            let statuses = supervisor.ps().await?;
            if json {
                println!("{}", render_json(&statuses)?);
            } else {
                println!("{}", render_table(&statuses, io::stdout().is_terminal()));
            }
        }
        PmCommand::Start(args) => {
            eprintln!("Starting '{}' ({})...", args.name, args.strategy);
            let request = StartRequest {
                name: args.name,
                strategy: args.strategy,
                config_path: args.config,
                account: args.account,
                yes: args.yes,
                non_interactive: args.non_interactive,
            };
            match supervisor.start(request).await {
                Ok(record) => println!(
                    "Started '{}' (pid {}, account {}). Logs: {}",
                    record.name,
                    record.pid,
                    record.account,
                    record.log_file.display()
                ),
                Err(e) => {
                    print_crash_tail(&e);
                    return Err(e.into());
                }
            }
        }
        PmCommand::Stop { name, yes } => {
            eprintln!("Stopping '{name}'...");
            match supervisor.stop(&name, yes).await? {
                StopOutcome::NotRunning => println!("'{name}' is not running (already stopped)"),
                StopOutcome::DroppedStale(record) => {
                    println!("'{name}' (pid {}) had already exited; record removed", record.pid);
                }
                StopOutcome::Terminated { record, forced } => {
                    let how = if forced { "killed after grace period" } else { "stopped" };
                    println!("'{name}' (pid {}) {how}", record.pid);
                }
            }
        }
        PmCommand::Restart { name } => {
            eprintln!("Restarting '{name}'...");
            match supervisor.restart(&name).await {
                Ok(record) => println!("Restarted '{name}' (pid {})", record.pid),
                Err(e) => {
                    print_crash_tail(&e);
                    return Err(e.into());
                }
            }
        }
        PmCommand::Kill { name, yes } => {
            eprintln!("Killing '{name}'...");
            let outcome = supervisor.kill(&name, yes).await?;
            if outcome.signalled {
                println!("'{name}' (pid {}) killed", outcome.record.pid);
            } else {
                println!("'{name}' (pid {}) was already gone; record removed", outcome.record.pid);
            }
        }
        PmCommand::StopAll { yes } => {
            eprintln!("Stopping all processes...");
            let outcome = supervisor.stop_all(yes).await?;
            println!("Signalled {} process(es)", outcome.signalled.len());
            for (name, reason) in &outcome.failed {
                println!("  failed to signal '{name}': {reason}");
            }
        }
        PmCommand::Logs {
            name,
            follow,
            lines,
        } => {
            let count = lines.unwrap_or(view.log_lines);
            let (path, offset) = match supervisor.logs(&name, count).await? {
                LogsView::NoLogsYet(path) => {
                    println!("No logs yet for '{name}' ({})", path.display());
                    (path, 0)
                }
                LogsView::Lines { path, tail } => {
                    for line in &tail.lines {
                        println!("{line}");
                    }
                    (path, tail.end_offset)
                }
            };
            if follow {
                eprintln!("Following {} (Ctrl-C to stop)", path.display());
                follow_until_interrupted(path, offset, view.follow_poll).await?;
            }
        }
    }
    Ok(())
}

fn print_crash_tail(error: &PmError) {
    if let PmError::ImmediateCrash { log_tail, .. } = error {
        if log_tail.is_empty() {
            eprintln!("(log is empty)");
        }
        for line in log_tail {
            eprintln!("  | {line}");
        }
    }
}

async fn follow_until_interrupted(path: PathBuf, offset: u64, poll: Duration) -> Result<()> {
    let lines = follow_lines(path.clone(), offset, poll);
    futures_util::pin_mut!(lines);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            next = lines.next() => match next {
                Some(Ok(line)) => println!("{line}"),
                Some(Err(e)) => {
                    return Err(e).with_context(|| format!("Failed to follow {}", path.display()));
                }
                None => break,
            },
        }
    }
    Ok(())
}
