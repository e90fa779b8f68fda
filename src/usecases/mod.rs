//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces. Use cases never
//! name an adapter; `main` wires the concrete ones in.
//!
//! Use cases:
//! - `Supervisor`: The `pm` commands (ps, start, stop, restart, kill, stop-all, logs)
//! - `StaleEntryCollector`: Prunes records of dead processes
//! - `run_worker`: Lifecycle of a supervised bot (`run` entry point)

pub mod stale_collector;
pub mod supervisor;
pub mod worker;
