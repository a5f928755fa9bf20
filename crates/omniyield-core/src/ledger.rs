//! Pure deposit/withdraw state transitions over pool and position.
//!
//! Validation happens before any field is written, so a failed operation
//! never leaves a partial update behind.

use chrono::{DateTime, Utc};

use crate::error::{Result, VaultError};
use crate::math;
use crate::state::{DepositorPosition, VaultPool};

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub pool: VaultPool,
    pub position: DepositorPosition,
}

impl Ledger {
    pub fn new(pool: VaultPool) -> Self {
        Self {
            pool,
            position: DepositorPosition::default(),
        }
    }

    /// Apply a deposit of `amount` motes, returning the shares minted.
    pub fn apply_deposit(&mut self, amount: u64, at: DateTime<Utc>) -> Result<u64> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let shares = math::shares_for_deposit(amount, &self.pool)?;
        if shares == 0 {
            // flooring to zero shares would absorb the motes with no claim
            return Err(VaultError::DepositTooSmall {
                min: self.pool.total_assets / self.pool.total_shares + 1,
            });
        }

        let total_assets = self
            .pool
            .total_assets
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        let total_shares = self
            .pool
            .total_shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        let position_shares = self
            .position
            .shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;

        self.pool.total_assets = total_assets;
        self.pool.total_shares = total_shares;
        self.position.shares = position_shares;
        self.position.last_action_at = Some(at);

        Ok(shares)
    }

    /// Apply a withdrawal of `shares`, returning the motes redeemed.
    pub fn apply_withdraw(&mut self, shares: u64, at: DateTime<Utc>) -> Result<u64> {
        if shares == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if shares > self.position.shares {
            return Err(VaultError::InsufficientShares);
        }

        let amount = math::amount_for_withdraw(shares, &self.pool)?;
        if amount == 0 {
            return Err(VaultError::WithdrawTooSmall);
        }

        // position.shares <= pool.total_shares, so neither sub can underflow
        // unless the pool was externally corrupted.
        let total_assets = self
            .pool
            .total_assets
            .checked_sub(amount)
            .ok_or(VaultError::MathOverflow)?;
        let total_shares = self
            .pool
            .total_shares
            .checked_sub(shares)
            .ok_or(VaultError::MathOverflow)?;

        self.pool.total_assets = total_assets;
        self.pool.total_shares = total_shares;
        self.position.shares -= shares;
        self.position.last_action_at = Some(at);

        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_bootstrap_deposit_updates_pool() {
        let mut ledger = Ledger::default();
        let shares = ledger.apply_deposit(1_000_000_000, now()).unwrap();
        assert_eq!(shares, 1_000_000_000);
        assert_eq!(ledger.pool.total_shares, 1_000_000_000);
        assert_eq!(ledger.pool.total_assets, 1_000_000_000);
        assert_eq!(ledger.position.shares, 1_000_000_000);
        assert!(ledger.position.last_action_at.is_some());
    }

    #[test]
    fn test_deposit_at_par_pool() {
        let mut ledger = Ledger::new(VaultPool {
            total_assets: 1_000_000_000,
            total_shares: 1_000_000_000,
        });
        let shares = ledger.apply_deposit(500_000_000, now()).unwrap();
        assert_eq!(shares, 500_000_000);
        assert_eq!(ledger.pool.total_assets, 1_500_000_000);
        assert_eq!(ledger.pool.total_shares, 1_500_000_000);
    }

    #[test]
    fn test_zero_deposit_rejected_without_mutation() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.apply_deposit(0, now()), Err(VaultError::InvalidAmount));
        assert_eq!(ledger.pool, VaultPool::default());
        assert_eq!(ledger.position.shares, 0);
    }

    #[test]
    fn test_deposit_flooring_to_zero_shares_rejected() {
        // share price of 10 CSPR per share; 1 CSPR floors to zero shares
        let mut ledger = Ledger::new(VaultPool {
            total_assets: 10_000_000_000,
            total_shares: 1,
        });
        let before = ledger.clone();
        assert_eq!(
            ledger.apply_deposit(1_000_000_000, now()),
            Err(VaultError::DepositTooSmall {
                min: 10_000_000_001
            })
        );
        assert_eq!(ledger.pool, before.pool);
        assert_eq!(ledger.position.shares, 0);
    }

    #[test]
    fn test_withdraw_flooring_to_zero_motes_rejected() {
        let mut ledger = Ledger {
            pool: VaultPool {
                total_assets: 1,
                total_shares: 10_000_000_000,
            },
            position: DepositorPosition {
                shares: 1_000_000_000,
                last_action_at: None,
            },
        };
        let before = ledger.clone();
        assert_eq!(
            ledger.apply_withdraw(5, now()),
            Err(VaultError::WithdrawTooSmall)
        );
        assert_eq!(ledger.pool, before.pool);
        assert_eq!(ledger.position, before.position);
    }

    #[test]
    fn test_withdraw_after_appreciation() {
        let mut ledger = Ledger {
            pool: VaultPool {
                total_assets: 2_000_000_000,
                total_shares: 1_000_000_000,
            },
            position: DepositorPosition {
                shares: 100_000_000,
                last_action_at: None,
            },
        };
        let amount = ledger.apply_withdraw(100_000_000, now()).unwrap();
        assert_eq!(amount, 200_000_000);
        assert_eq!(ledger.pool.total_assets, 1_800_000_000);
        assert_eq!(ledger.pool.total_shares, 900_000_000);
        assert_eq!(ledger.position.shares, 0);
    }

    #[test]
    fn test_overdraw_rejected_without_mutation() {
        let mut ledger = Ledger {
            pool: VaultPool {
                total_assets: 1_000_000_000,
                total_shares: 1_000_000_000,
            },
            position: DepositorPosition {
                shares: 10,
                last_action_at: None,
            },
        };
        let before = ledger.clone();
        assert_eq!(
            ledger.apply_withdraw(11, now()),
            Err(VaultError::InsufficientShares)
        );
        assert_eq!(ledger.pool, before.pool);
        assert_eq!(ledger.position, before.position);
    }

    #[test]
    fn test_zero_withdraw_rejected() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.apply_withdraw(0, now()), Err(VaultError::InvalidAmount));
    }
}
