//! Log Adapters - Tail and Follow of Worker Log Files

pub mod tail;

pub use tail::{FileLogReader, follow_lines, tail_lines};
