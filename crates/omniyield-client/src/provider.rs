//! Wallet provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConnectError;

/// An account handed back by a wallet provider on connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub public_key: String,
    pub account_hash: String,
}

impl WalletAccount {
    pub fn from_public_key(public_key: impl Into<String>) -> Self {
        let public_key = public_key.into();
        let prefix: String = public_key.chars().take(20).collect();
        Self {
            account_hash: format!("account-hash-{prefix}"),
            public_key,
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Request a connection. May only fail while connecting; the caller is
    /// responsible for session state transitions.
    async fn connect(&self) -> Result<WalletAccount, ConnectError>;

    /// Current balance in motes.
    async fn fetch_balance(&self, account: &WalletAccount) -> anyhow::Result<u64>;

    /// Sign an arbitrary message with the connected account.
    async fn sign_message(&self, account: &WalletAccount, message: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Extension,
    Web,
}

/// A wallet the dashboard knows how to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub kind: ProviderKind,
    pub installed: bool,
    pub install_url: String,
}

/// Directory of known wallet providers and which of them are present.
#[derive(Debug, Clone, Default)]
pub struct ProviderDirectory {
    providers: Vec<ProviderInfo>,
}

impl ProviderDirectory {
    pub fn new(providers: Vec<ProviderInfo>) -> Self {
        Self { providers }
    }

    /// The known provider set with nothing detected, still listing install
    /// links for the recommended wallets.
    pub fn recommended() -> Self {
        Self::new(vec![
            ProviderInfo {
                name: "Casper Wallet".to_string(),
                kind: ProviderKind::Extension,
                installed: false,
                install_url: "https://chrome.google.com/webstore/detail/casper-wallet".to_string(),
            },
            ProviderInfo {
                name: "CSPR.click".to_string(),
                kind: ProviderKind::Web,
                installed: false,
                install_url: "https://cspr.click".to_string(),
            },
        ])
    }

    pub fn providers(&self) -> &[ProviderInfo] {
        &self.providers
    }

    pub fn has_wallet(&self) -> bool {
        self.providers.iter().any(|p| p.installed)
    }

    /// First installed provider, if any.
    pub fn primary(&self) -> Option<&ProviderInfo> {
        self.providers.iter().find(|p| p.installed)
    }
}
