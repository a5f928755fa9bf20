use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::PRICE_SCALE;

/// Aggregate deposited-asset/share accounting for the vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPool {
    /// Total motes held by the vault.
    pub total_assets: u64,
    /// Total shares outstanding.
    pub total_shares: u64,
}

impl VaultPool {
    /// Share price as a 1e18 fixed-point ratio. An empty pool prices at par.
    pub fn share_price_scaled(&self) -> u128 {
        if self.total_shares == 0 {
            return PRICE_SCALE;
        }
        (self.total_assets as u128) * PRICE_SCALE / (self.total_shares as u128)
    }
}

/// Pool aggregates plus the vault-wide statistics the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub pool: VaultPool,
    pub total_depositors: u32,
    pub min_deposit: u64,
    pub performance_fee_bps: u16,
    pub paused: bool,
}

/// The current user's claim on the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositorPosition {
    pub shares: u64,
    pub last_action_at: Option<DateTime<Utc>>,
}

impl DepositorPosition {
    /// Motes this position would redeem for at the current share price.
    pub fn implied_balance(&self, pool: &VaultPool) -> u64 {
        let motes = (self.shares as u128) * pool.share_price_scaled() / PRICE_SCALE;
        motes.min(u64::MAX as u128) as u64
    }
}

/// A single yield accrual reported by a strategy on some chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldEvent {
    pub id: Uuid,
    pub amount: u64,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub verified: bool,
}

/// A cross-chain allocation of pooled funds to a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub chain_id: u32,
    pub chain_name: String,
    pub amount: u64,
    pub strategy: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// An available yield strategy and its target allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub chain_id: u32,
    pub chain_name: String,
    /// Percentage of the pool targeted at this strategy.
    pub allocation_pct: u8,
    /// Advertised APY in basis points.
    pub apy_bps: u32,
    pub strategy: String,
    pub risk: RiskLevel,
}
