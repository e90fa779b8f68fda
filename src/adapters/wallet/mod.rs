//! Wallet Adapters - Local Private-Key Signer

pub mod env_wallet;

pub use env_wallet::{EnvWallet, PRIVATE_KEY_ENV};
