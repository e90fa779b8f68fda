//! Terminal prompt.
//!
//! Questions go to stderr so `--json` output on stdout stays clean.
//! Without a terminal on stdin every confirmation is a no; scripts
//! must pass `--yes`.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use nix::sys::termios::{self, LocalFlags, SetArg};
use tracing::warn;

use crate::ports::prompt::Prompt;

/// [`Prompt`] reading answers from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

fn read_answer() -> io::Result<String> {
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Whether an answer counts as yes.
fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> bool {
        if !io::stdin().is_terminal() {
            warn!("stdin is not a terminal; pass --yes to confirm");
            return false;
        }

        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();
        read_answer().is_ok_and(|answer| is_yes(&answer))
    }

    fn secret(&self, message: &str) -> Result<String> {
        let stdin = io::stdin();
        anyhow::ensure!(
            stdin.is_terminal(),
            "stdin is not a terminal; cannot prompt for a secret"
        );

        eprint!("{message}");
        let _ = io::stderr().flush();

        let original = termios::tcgetattr(&stdin).context("Failed to read terminal mode")?;
        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        termios::tcsetattr(&stdin, SetArg::TCSANOW, &silent)
            .context("Failed to disable echo")?;

        let answer = read_answer();

        termios::tcsetattr(&stdin, SetArg::TCSANOW, &original)
            .context("Failed to restore terminal mode")?;
        eprintln!();

        let answer = answer.context("Failed to read secret")?;
        anyhow::ensure!(!answer.is_empty(), "no secret entered");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        for answer in ["y", "Y", "yes", "YES"] {
            assert!(is_yes(answer));
        }
        for answer in ["", "n", "no", "yep", "sure"] {
            assert!(!is_yes(answer));
        }
    }
}
