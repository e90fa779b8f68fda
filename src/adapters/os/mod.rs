//! OS Adapters - Signals and Detached Spawning (Unix)
//!
//! - `signals`: `kill(pid, 0)` liveness probe, SIGTERM/SIGKILL delivery
//! - `launcher`: worker spawn in its own process group with log redirection

pub mod launcher;
pub mod signals;

pub use launcher::DetachedLauncher;
pub use signals::SignalProcessControl;
