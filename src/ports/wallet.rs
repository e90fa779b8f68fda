//! Wallet Port - Credential Availability
//!
//! Key management lives elsewhere. The supervisor only needs to know
//! whether credentials are usable and how to hand them to a child,
//! since an unlocked session cannot be shared across processes.

use async_trait::async_trait;

/// Wallet credentials as seen by the supervisor.
#[async_trait]
pub trait WalletService: Send + Sync + 'static {
  /// Whether signing credentials are currently available.
  async fn is_unlocked(&self) -> bool;

  /// Unlock with an operator-supplied secret.
  async fn unlock(&self, secret: &str) -> anyhow::Result<()>;

  /// Display name for the wallet (configured name or address).
  async fn label(&self) -> Option<String>;

  /// Environment variables that let a child process sign without prompting.
  async fn child_env(&self) -> Vec<(String, String)>;
}
