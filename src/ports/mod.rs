//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the supervisor use cases require
//! from the outside world. Adapters implement these traits; tests
//! swap in fakes so no real process has to be spawned.
//!
//! Port categories:
//! - `RecordStore`: Durable process table (JSON file)
//! - `ProcessControl`: Liveness probe and termination signals
//! - `Launcher`: Detached worker spawning
//! - `LogReader`: Tail of per-process log files
//! - `WalletService`: Credential availability and forwarding
//! - `Prompt`: Operator confirmation and secret entry

pub mod launcher;
pub mod logs;
pub mod process;
pub mod prompt;
pub mod record_store;
pub mod wallet;
