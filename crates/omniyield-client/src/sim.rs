//! Randomized simulation of the wallet provider and vault backend.
//!
//! Mirrors what the real collaborators would return, with artificial
//! latencies and randomized figures. Seedable for deterministic tests;
//! latency can be disabled entirely.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use omniyield_core::constants::MOTES_PER_CSPR;
use omniyield_core::{Allocation, PoolStats, RiskLevel, Strategy, TxStatus, VaultPool, YieldEvent};

use crate::backend::{
    Finality, PositionSnapshot, StatusSource, SubmitReceipt, VaultBackend, CHAINS,
};
use crate::error::ConnectError;
use crate::provider::{WalletAccount, WalletProvider};

fn random_hex(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap())
        .collect()
}

/// Simulated wallet extension.
pub struct SimWalletProvider {
    rng: Mutex<StdRng>,
    last_balance: Mutex<Option<u64>>,
    latency: bool,
}

impl SimWalletProvider {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            last_balance: Mutex::new(None),
            latency: true,
        }
    }

    pub fn without_latency(mut self) -> Self {
        self.latency = false;
        self
    }

    async fn delay(&self, ms: u64) {
        if self.latency {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl Default for SimWalletProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for SimWalletProvider {
    fn name(&self) -> &str {
        "Simulated Wallet"
    }

    async fn connect(&self) -> Result<WalletAccount, ConnectError> {
        self.delay(1_500).await;
        let public_key = {
            let mut rng = self.rng.lock().unwrap();
            format!("02{}", random_hex(&mut rng, 64))
        };
        Ok(WalletAccount::from_public_key(public_key))
    }

    async fn fetch_balance(&self, _account: &WalletAccount) -> anyhow::Result<u64> {
        self.delay(500).await;
        let mut rng = self.rng.lock().unwrap();
        let mut last = self.last_balance.lock().unwrap();
        let balance = match *last {
            // first fetch lands in the 5,000..15,000 CSPR range
            None => rng.gen_range(5_000 * MOTES_PER_CSPR..15_000 * MOTES_PER_CSPR),
            // afterwards the balance takes a +/- 0.1 CSPR random walk
            Some(previous) => {
                let step = rng.gen_range(0..=100_000_000u64);
                if rng.gen_bool(0.5) {
                    previous.saturating_add(step)
                } else {
                    previous.saturating_sub(step)
                }
            }
        };
        *last = Some(balance);
        Ok(balance)
    }

    async fn sign_message(
        &self,
        _account: &WalletAccount,
        _message: &str,
    ) -> anyhow::Result<String> {
        self.delay(1_000).await;
        let mut rng = self.rng.lock().unwrap();
        Ok(format!("signature-{}", random_hex(&mut rng, 128)))
    }
}

/// Simulated vault backend with randomized aggregates.
pub struct SimBackend {
    rng: Mutex<StdRng>,
    latency: bool,
}

impl SimBackend {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            latency: true,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            latency: true,
        }
    }

    pub fn without_latency(mut self) -> Self {
        self.latency = false;
        self
    }

    async fn delay(&self, ms: u64) {
        if self.latency {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn deploy_hash(&self) -> String {
        let mut rng = self.rng.lock().unwrap();
        format!("deploy-{}", random_hex(&mut rng, 64))
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultBackend for SimBackend {
    async fn pool_stats(&self) -> anyhow::Result<PoolStats> {
        self.delay(800).await;
        let mut rng = self.rng.lock().unwrap();
        Ok(PoolStats {
            pool: VaultPool {
                total_assets: rng.gen_range(500_000 * MOTES_PER_CSPR..1_500_000 * MOTES_PER_CSPR),
                total_shares: rng.gen_range(400_000 * MOTES_PER_CSPR..1_300_000 * MOTES_PER_CSPR),
            },
            total_depositors: rng.gen_range(100..600),
            min_deposit: MOTES_PER_CSPR,
            performance_fee_bps: 2_000,
            paused: false,
        })
    }

    async fn position(&self, _account: &WalletAccount) -> anyhow::Result<PositionSnapshot> {
        self.delay(600).await;
        let mut rng = self.rng.lock().unwrap();
        let shares = rng.gen_range(0..10_000 * MOTES_PER_CSPR);
        let implied_balance = rng.gen_range(0..12_000 * MOTES_PER_CSPR);
        let hours_ago = rng.gen_range(0..24 * 7);
        Ok(PositionSnapshot {
            shares,
            implied_balance,
            last_action_at: Some(Utc::now() - ChronoDuration::hours(hours_ago)),
        })
    }

    async fn token_balance(&self, _account: &WalletAccount) -> anyhow::Result<u64> {
        self.delay(400).await;
        let mut rng = self.rng.lock().unwrap();
        Ok(rng.gen_range(0..10_000 * MOTES_PER_CSPR))
    }

    async fn submit_deposit(
        &self,
        _account: &WalletAccount,
        _amount: u64,
    ) -> anyhow::Result<SubmitReceipt> {
        self.delay(2_000).await;
        Ok(SubmitReceipt {
            external_ref: self.deploy_hash(),
            finality: Finality::Immediate,
        })
    }

    async fn submit_withdraw(
        &self,
        _account: &WalletAccount,
        _shares: u64,
    ) -> anyhow::Result<SubmitReceipt> {
        self.delay(2_000).await;
        Ok(SubmitReceipt {
            external_ref: self.deploy_hash(),
            finality: Finality::Immediate,
        })
    }

    async fn submit_allocation(
        &self,
        _account: &WalletAccount,
        _chain_id: u32,
        _amount: u64,
        _strategy: &str,
    ) -> anyhow::Result<SubmitReceipt> {
        self.delay(2_000).await;
        Ok(SubmitReceipt {
            external_ref: self.deploy_hash(),
            finality: Finality::Immediate,
        })
    }

    async fn simulate_yield(&self, _account: &WalletAccount) -> anyhow::Result<YieldEvent> {
        self.delay(1_500).await;
        let mut rng = self.rng.lock().unwrap();
        Ok(YieldEvent {
            id: Uuid::new_v4(),
            amount: rng.gen_range(0..MOTES_PER_CSPR),
            source: "Simulation".to_string(),
            created_at: Utc::now(),
            verified: true,
        })
    }

    async fn yield_history(&self) -> anyhow::Result<Vec<YieldEvent>> {
        self.delay(300).await;
        let mut rng = self.rng.lock().unwrap();
        let now = Utc::now();
        Ok((0..30)
            .map(|i| YieldEvent {
                id: Uuid::new_v4(),
                amount: rng.gen_range(500_000_000..8_500_000_000u64),
                source: CHAINS[i % 7].1.to_string(),
                created_at: now - ChronoDuration::days(i as i64),
                verified: i < 25,
            })
            .collect())
    }

    async fn allocations(&self) -> anyhow::Result<Vec<Allocation>> {
        self.delay(300).await;
        let amounts: [u64; 8] = [4_500, 3_200, 2_800, 1_500, 2_100, 1_800, 1_200, 900];
        let strategies = [
            "Lido Staking",
            "Aave Lending",
            "PancakeSwap LP",
            "Liquid Staking",
            "GMX Staking",
            "Velodrome LP",
            "Trader Joe LP",
            "SpookySwap LP",
        ];
        let now = Utc::now();
        Ok(CHAINS
            .iter()
            .enumerate()
            .map(|(i, (chain_id, chain_name))| Allocation {
                chain_id: *chain_id,
                chain_name: chain_name.to_string(),
                amount: amounts[i] * MOTES_PER_CSPR,
                strategy: strategies[i].to_string(),
                created_at: now - ChronoDuration::days(i as i64 + 1),
            })
            .collect())
    }

    async fn strategies(&self) -> anyhow::Result<Vec<Strategy>> {
        self.delay(300).await;
        let table: [(u8, u32, &str, RiskLevel); 8] = [
            (25, 420, "Lido Staking", RiskLevel::Low),
            (18, 580, "Aave Lending", RiskLevel::Low),
            (15, 750, "PancakeSwap LP", RiskLevel::Medium),
            (12, 920, "Liquid Staking", RiskLevel::Low),
            (12, 840, "GMX Staking", RiskLevel::Medium),
            (10, 680, "Velodrome LP", RiskLevel::Medium),
            (5, 1_120, "Trader Joe LP", RiskLevel::High),
            (3, 1_450, "SpookySwap LP", RiskLevel::High),
        ];
        Ok(CHAINS
            .iter()
            .zip(table)
            .map(
                |((chain_id, chain_name), (allocation_pct, apy_bps, strategy, risk))| Strategy {
                    chain_id: *chain_id,
                    chain_name: chain_name.to_string(),
                    allocation_pct,
                    apy_bps,
                    strategy: strategy.to_string(),
                    risk,
                },
            )
            .collect())
    }
}

#[async_trait]
impl StatusSource for SimBackend {
    /// Simulated deploys settle immediately.
    async fn status(&self, _external_ref: &str) -> anyhow::Result<TxStatus> {
        Ok(TxStatus::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_backend_is_deterministic() {
        let a = SimBackend::seeded(7).without_latency();
        let b = SimBackend::seeded(7).without_latency();
        assert_eq!(a.pool_stats().await.unwrap(), b.pool_stats().await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_yields_casper_style_key() {
        let provider = SimWalletProvider::seeded(1).without_latency();
        let account = provider.connect().await.unwrap();
        assert_eq!(account.public_key.len(), 66);
        assert!(account.public_key.starts_with("02"));
        assert!(account.account_hash.starts_with("account-hash-"));
    }

    #[tokio::test]
    async fn test_balance_random_walks_after_first_fetch() {
        let provider = SimWalletProvider::seeded(2).without_latency();
        let account = provider.connect().await.unwrap();
        let first = provider.fetch_balance(&account).await.unwrap();
        let second = provider.fetch_balance(&account).await.unwrap();
        let diff = first.abs_diff(second);
        assert!(diff <= 100_000_000);
    }

    #[tokio::test]
    async fn test_pool_stats_in_expected_ranges() {
        let backend = SimBackend::seeded(3).without_latency();
        let stats = backend.pool_stats().await.unwrap();
        assert!(stats.pool.total_assets >= 500_000 * MOTES_PER_CSPR);
        assert!(stats.pool.total_shares >= 400_000 * MOTES_PER_CSPR);
        assert!(!stats.paused);
        assert_eq!(stats.min_deposit, MOTES_PER_CSPR);
    }

    #[tokio::test]
    async fn test_yield_history_is_bounded_and_sourced() {
        let backend = SimBackend::seeded(4).without_latency();
        let history = backend.yield_history().await.unwrap();
        assert_eq!(history.len(), 30);
        assert!(history.iter().take(25).all(|e| e.verified));
        assert!(history.iter().skip(25).all(|e| !e.verified));
    }
}
