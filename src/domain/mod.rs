//! Domain layer - Supervisor records, strategies and error taxonomy.
//!
//! Pure types shared by every other layer. Nothing in here touches
//! the filesystem, the OS process table or the terminal.

pub mod error;
pub mod process;
pub mod strategy;

// Re-export core types for convenience
pub use error::PmError;
pub use process::{
    ProcessRecord, ProcessStatus, ProcessStore, MAX_NAME_LEN, STORE_VERSION, validate_name,
};
pub use strategy::Strategy;
