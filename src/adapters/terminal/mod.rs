//! Terminal Adapters - Operator Prompts on stdin/stderr

pub mod prompt;

pub use prompt::TerminalPrompt;
