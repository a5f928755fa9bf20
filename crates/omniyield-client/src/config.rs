//! Client configuration.

use std::time::Duration;

use omniyield_core::constants::{DEFAULT_JOURNAL_CAPACITY, DEFAULT_MIN_DEPOSIT, GAS_RESERVE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://testnet.cspr.live",
            Network::Mainnet => "https://cspr.live",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,

    /// JSON-RPC node for deploy status lookups, if any.
    pub rpc_url: Option<String>,
    pub rpc_api_key: Option<String>,

    /// How often the ledger re-derives pool aggregates.
    pub pool_refresh_interval: Duration,
    /// How often a connected session refreshes the wallet balance.
    pub balance_refresh_interval: Duration,

    /// Interval between status polls for pending transactions.
    pub status_poll_interval: Duration,
    /// Poll attempts per record before it is marked failed.
    pub status_poll_attempts: u32,

    pub journal_capacity: usize,
    pub yield_history_limit: usize,
    pub allocation_limit: usize,

    pub min_deposit: u64,
    pub gas_reserve: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            rpc_url: None,
            rpc_api_key: None,
            pool_refresh_interval: Duration::from_secs(30),
            balance_refresh_interval: Duration::from_secs(30),
            status_poll_interval: Duration::from_secs(5),
            status_poll_attempts: 60,
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            yield_history_limit: 50,
            allocation_limit: 20,
            min_deposit: DEFAULT_MIN_DEPOSIT,
            gas_reserve: GAS_RESERVE,
        }
    }
}

impl Config {
    /// Load configuration from `OMNIYIELD_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(network) = std::env::var("OMNIYIELD_NETWORK") {
            if network.eq_ignore_ascii_case("mainnet") {
                cfg.network = Network::Mainnet;
            }
        }
        cfg.rpc_url = std::env::var("OMNIYIELD_RPC_URL").ok();
        cfg.rpc_api_key = std::env::var("OMNIYIELD_RPC_API_KEY").ok();

        if let Some(secs) = env_u64("OMNIYIELD_POOL_REFRESH_SECS") {
            cfg.pool_refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("OMNIYIELD_BALANCE_REFRESH_SECS") {
            cfg.balance_refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("OMNIYIELD_STATUS_POLL_SECS") {
            cfg.status_poll_interval = Duration::from_secs(secs);
        }
        if let Some(n) = env_u64("OMNIYIELD_STATUS_POLL_ATTEMPTS") {
            cfg.status_poll_attempts = n as u32;
        }
        if let Some(n) = env_u64("OMNIYIELD_JOURNAL_CAPACITY") {
            cfg.journal_capacity = n as usize;
        }
        if let Some(n) = env_u64("OMNIYIELD_MIN_DEPOSIT_MOTES") {
            cfg.min_deposit = n;
        }

        cfg
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.network, Network::Testnet);
        assert_eq!(cfg.status_poll_attempts, 60);
        assert_eq!(cfg.journal_capacity, 100);
        assert_eq!(cfg.pool_refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_explorer_url() {
        assert!(Network::Testnet.explorer_url().contains("testnet"));
    }
}
