//! Environment Wallet - alloy `PrivateKeySigner` from env or prompt
//!
//! The key comes from `DEXBOT_PRIVATE_KEY` (never from a committed
//! file) or is pasted at the unlock prompt. Workers cannot share the
//! supervisor's unlocked session, so the key is forwarded to them in
//! the same environment variable.

use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::ports::wallet::WalletService;

/// Environment variable carrying the hex private key.
pub const PRIVATE_KEY_ENV: &str = "DEXBOT_PRIVATE_KEY";

/// A validated key plus its original hex form for forwarding.
struct UnlockedKey {
    signer: PrivateKeySigner,
    secret: String,
}

impl UnlockedKey {
    fn parse(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let signer = PrivateKeySigner::from_str(secret).context("Invalid private key")?;
        Ok(Self {
            signer,
            secret: secret.to_string(),
        })
    }
}

/// [`WalletService`] holding at most one local signer.
pub struct EnvWallet {
    /// Configured display name.
    name: Option<String>,
    /// Signer once unlocked.
    unlocked: RwLock<Option<UnlockedKey>>,
}

impl EnvWallet {
    /// A locked wallet.
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            unlocked: RwLock::new(None),
        }
    }

    /// Unlocked from `DEXBOT_PRIVATE_KEY` when set and valid, locked otherwise.
    pub fn from_env(name: Option<String>) -> Self {
        let unlocked = match std::env::var(PRIVATE_KEY_ENV) {
            Ok(secret) if !secret.trim().is_empty() => match UnlockedKey::parse(&secret) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, "Ignoring invalid {PRIVATE_KEY_ENV}");
                    None
                }
            },
            _ => None,
        };

        Self {
            name,
            unlocked: RwLock::new(unlocked),
        }
    }

    /// An unlocked wallet for a known key.
    ///
    /// # Errors
    /// Returns an error if `secret` is not a valid private key.
    pub fn with_secret(name: Option<String>, secret: &str) -> Result<Self> {
        let key = UnlockedKey::parse(secret)?;
        Ok(Self {
            name,
            unlocked: RwLock::new(Some(key)),
        })
    }
}

#[async_trait]
impl WalletService for EnvWallet {
    async fn is_unlocked(&self) -> bool {
        self.unlocked.read().await.is_some()
    }

    async fn unlock(&self, secret: &str) -> Result<()> {
        let key = UnlockedKey::parse(secret)?;
        info!(address = %key.signer.address(), "Wallet unlocked");
        *self.unlocked.write().await = Some(key);
        Ok(())
    }

    async fn label(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        self.unlocked
            .read()
            .await
            .as_ref()
            .map(|key| key.signer.address().to_string())
    }

    async fn child_env(&self) -> Vec<(String, String)> {
        self.unlocked
            .read()
            .await
            .as_ref()
            .map(|key| vec![(PRIVATE_KEY_ENV.to_string(), key.secret.clone())])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (anvil account #0).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[tokio::test]
    async fn test_locked_wallet_forwards_nothing() {
        let wallet = EnvWallet::new(None);
        assert!(!wallet.is_unlocked().await);
        assert!(wallet.label().await.is_none());
        assert!(wallet.child_env().await.is_empty());
    }

    #[tokio::test]
    async fn test_unlock_derives_address_label() {
        let wallet = EnvWallet::new(None);
        wallet.unlock(&format!("  {DEV_KEY}\n")).await.unwrap();

        assert!(wallet.is_unlocked().await);
        assert_eq!(wallet.label().await.as_deref(), Some(DEV_ADDRESS));
        assert_eq!(
            wallet.child_env().await,
            [(PRIVATE_KEY_ENV.to_string(), DEV_KEY.to_string())]
        );
    }

    #[tokio::test]
    async fn test_configured_name_wins() {
        let wallet = EnvWallet::with_secret(Some("ops-hot".to_string()), DEV_KEY).unwrap();
        assert_eq!(wallet.label().await.as_deref(), Some("ops-hot"));
    }

    #[tokio::test]
    async fn test_invalid_key_stays_locked() {
        let wallet = EnvWallet::new(None);
        assert!(wallet.unlock("not-a-key").await.is_err());
        assert!(!wallet.is_unlocked().await);
    }
}
