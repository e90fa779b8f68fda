//! dexbot - Background Process Supervisor for the DEX Trading CLI
//!
//! Re-exports all modules for the binary, integration tests and benchmarks.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
