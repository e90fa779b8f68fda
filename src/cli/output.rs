//! Rendering of `pm ps`.

use anyhow::{Context, Result};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

use crate::domain::process::ProcessStatus;

#[derive(Tabled)]
struct ProcessRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "pid")]
    pid: u32,
    #[tabled(rename = "strategy")]
    strategy: String,
    #[tabled(rename = "account")]
    account: String,
    #[tabled(rename = "wallet")]
    wallet: String,
    #[tabled(rename = "status")]
    status: &'static str,
    #[tabled(rename = "uptime")]
    uptime: String,
}

impl From<&ProcessStatus> for ProcessRow {
    fn from(status: &ProcessStatus) -> Self {
        let record = &status.record;
        Self {
            name: record.name.clone(),
            pid: record.pid,
            strategy: record.strategy.to_string(),
            account: record.account.clone(),
            wallet: record.wallet.clone().unwrap_or_else(|| "-".to_string()),
            status: if status.running { "running" } else { "stopped" },
            uptime: format_uptime(status.uptime_ms),
        }
    }
}

/// Human-readable table, or a one-line notice when empty.
///
/// `styled` bolds the header row with ANSI escapes; pass it only when
/// the output is a terminal.
pub fn render_table(statuses: &[ProcessStatus], styled: bool) -> String {
    if statuses.is_empty() {
        return "No processes running".to_string();
    }

    let rows: Vec<ProcessRow> = statuses.iter().map(ProcessRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded().remove_horizontals());
    if styled {
        table.with(Modify::new(Rows::first()).with(Color::BOLD));
    }
    table.to_string()
}

/// JSON array of statuses (`[]` when empty).
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json(statuses: &[ProcessStatus]) -> Result<String> {
    serde_json::to_string_pretty(statuses).context("Failed to serialize process list")
}

/// Compact uptime: `42s`, `5m 3s`, `2h 5m`, `3d 4h`.
pub fn format_uptime(ms: u64) -> String {
    let secs = ms / 1_000;
    let (days, hours, mins) = (secs / 86_400, secs % 86_400 / 3_600, secs % 3_600 / 60);
    match (days, hours, mins) {
        (0, 0, 0) => format!("{secs}s"),
        (0, 0, m) => format!("{m}m {}s", secs % 60),
        (0, h, m) => format!("{h}h {m}m"),
        (d, h, _) => format!("{d}d {h}h"),
    }
}
