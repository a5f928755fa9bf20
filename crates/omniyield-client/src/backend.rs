//! Backend collaborator traits.
//!
//! The vault ledger talks to the chain (or a simulation of it) only through
//! these interfaces, so a deterministic test double and a real RPC-backed
//! implementation are interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use omniyield_core::{Allocation, PoolStats, Strategy, TxStatus, YieldEvent};

use crate::provider::WalletAccount;

/// Chains the vault allocates across.
pub const CHAINS: [(u32, &str); 8] = [
    (1, "Ethereum"),
    (137, "Polygon"),
    (56, "BSC"),
    (0, "Casper"),
    (42161, "Arbitrum"),
    (10, "Optimism"),
    (43114, "Avalanche"),
    (250, "Fantom"),
];

/// Display name for a chain id.
pub fn chain_name(chain_id: u32) -> &'static str {
    CHAINS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// How a submitted operation settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
    /// Settled by the time the submit call returns (simulated backends).
    Immediate,
    /// Settles later; the status poller tracks the external reference.
    Tracked,
}

#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// Deploy hash or equivalent reference issued by the backend.
    pub external_ref: String,
    pub finality: Finality,
}

/// The depositor's position as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub shares: u64,
    pub implied_balance: u64,
    pub last_action_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait VaultBackend: Send + Sync {
    async fn pool_stats(&self) -> anyhow::Result<PoolStats>;

    async fn position(&self, account: &WalletAccount) -> anyhow::Result<PositionSnapshot>;

    async fn token_balance(&self, account: &WalletAccount) -> anyhow::Result<u64>;

    async fn submit_deposit(
        &self,
        account: &WalletAccount,
        amount: u64,
    ) -> anyhow::Result<SubmitReceipt>;

    async fn submit_withdraw(
        &self,
        account: &WalletAccount,
        shares: u64,
    ) -> anyhow::Result<SubmitReceipt>;

    async fn submit_allocation(
        &self,
        account: &WalletAccount,
        chain_id: u32,
        amount: u64,
        strategy: &str,
    ) -> anyhow::Result<SubmitReceipt>;

    /// Trigger a yield accrual and report the resulting event.
    async fn simulate_yield(&self, account: &WalletAccount) -> anyhow::Result<YieldEvent>;

    async fn yield_history(&self) -> anyhow::Result<Vec<YieldEvent>>;

    async fn allocations(&self) -> anyhow::Result<Vec<Allocation>>;

    async fn strategies(&self) -> anyhow::Result<Vec<Strategy>>;
}

/// Resolves the status of a submitted operation.
///
/// Implementations must report a reference the backend has not indexed yet
/// as `Pending`, never as `Failed`.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self, external_ref: &str) -> anyhow::Result<TxStatus>;
}
