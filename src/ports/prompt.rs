//! Prompt Port - Operator Interaction

/// Interactive confirmation and secret entry.
pub trait Prompt: Send + Sync + 'static {
  /// Ask a yes/no question. Anything but an explicit yes is a no.
  fn confirm(&self, message: &str) -> bool;

  /// Read a secret without echoing it.
  fn secret(&self, message: &str) -> anyhow::Result<String>;
}
