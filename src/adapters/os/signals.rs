//! Signal-based process control via nix.
//!
//! Liveness is a null-signal probe. Any error, including EPERM, means
//! "not alive": the supervisor only cares about processes it can
//! still signal.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::debug;

use crate::domain::error::PmError;
use crate::ports::process::{ProcessControl, TermSignal};

/// [`ProcessControl`] backed by `kill(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalProcessControl;

/// Convert a recorded pid to a signalable one.
///
/// pid 0 would address our own process group and values above
/// `i32::MAX` would wrap to group ids, so both are refused.
fn to_pid(pid: u32) -> Option<Pid> {
    if pid == 0 {
        return None;
    }
    i32::try_from(pid).ok().map(Pid::from_raw)
}

impl ProcessControl for SignalProcessControl {
    fn is_alive(&self, pid: u32) -> bool {
        let Some(target) = to_pid(pid) else {
            return false;
        };
        match kill(target, None) {
            Ok(()) => !is_zombie(pid),
            Err(errno) => {
                debug!(pid, error = %errno, "Liveness probe failed");
                false
            }
        }
    }

    fn terminate(&self, pid: u32, signal: TermSignal) -> Result<(), PmError> {
        let target = to_pid(pid).ok_or_else(|| PmError::SignalDelivery {
            pid,
            reason: "not a signalable pid".to_string(),
        })?;
        let sig = match signal {
            TermSignal::Graceful => Signal::SIGTERM,
            TermSignal::Forceful => Signal::SIGKILL,
        };
        kill(target, sig).map_err(|errno| PmError::SignalDelivery {
            pid,
            reason: errno.desc().to_string(),
        })?;
        debug!(pid, signal = %sig, "Signal delivered");
        Ok(())
    }
}

/// Exited-but-unreaped processes still answer `kill(pid, 0)`.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            // comm may contain spaces or parens; the state follows the last ')'
            let (_, rest) = stat.rsplit_once(')')?;
            rest.split_whitespace().next().map(|state| state == "Z")
        })
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
const fn is_zombie(_pid: u32) -> bool {
    false
}
