//! Process Control Port - OS Process Handle
//!
//! A pid is treated as an opaque handle that can be probed and
//! signalled. The probe is the only liveness mechanism: no
//! heartbeat, no IPC, no shared memory.

use crate::domain::error::PmError;

/// Termination strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
  /// Ask the process to exit (SIGTERM).
  Graceful,
  /// Kill the process outright (SIGKILL).
  Forceful,
}

/// Liveness probe and signal delivery for recorded pids.
pub trait ProcessControl: Send + Sync + 'static {
  /// Whether `pid` exists and can be signalled by us.
  ///
  /// "No such process" and "not permitted" both count as not alive.
  fn is_alive(&self, pid: u32) -> bool;

  /// Send a termination signal to `pid`.
  ///
  /// # Errors
  /// Returns [`PmError::SignalDelivery`] if the OS rejects the signal.
  fn terminate(&self, pid: u32, signal: TermSignal) -> Result<(), PmError>;
}
