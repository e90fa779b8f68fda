//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! OS and filesystem dependencies. Each sub-module groups adapters by
//! infrastructure concern.
//!
//! Adapter categories:
//! - `persistence`: JSON process table with atomic replace
//! - `os`: nix signal probes and detached spawning
//! - `logs`: Log tail and follow stream
//! - `wallet`: alloy private-key signer from the environment
//! - `terminal`: stdin confirmation and hidden secret entry

pub mod logs;
pub mod os;
pub mod persistence;
pub mod terminal;
pub mod wallet;
