//! Share/asset conversion.
//!
//! All conversions are integer-only with u128 intermediates and floor
//! rounding, so repeated deposits and withdrawals never drift the way the
//! equivalent floating-point math would.

use crate::error::{Result, VaultError};
use crate::state::VaultPool;

/// Shares minted for a deposit of `amount` motes.
///
/// Formula: shares = floor(amount × total_shares / total_assets)
///
/// An empty pool (`total_shares == 0`) bootstraps at 1:1. A pool holding
/// shares but no assets violates the pool invariant and is rejected rather
/// than minting infinite shares.
pub fn shares_for_deposit(amount: u64, pool: &VaultPool) -> Result<u64> {
    if pool.total_shares == 0 {
        return Ok(amount);
    }
    if pool.total_assets == 0 {
        return Err(VaultError::DivisionByZero);
    }
    mul_div(amount, pool.total_shares, pool.total_assets)
}

/// Motes returned for redeeming `shares`.
///
/// Formula: amount = floor(shares × total_assets / total_shares)
///
/// An empty pool redeems to nothing.
pub fn amount_for_withdraw(shares: u64, pool: &VaultPool) -> Result<u64> {
    if pool.total_shares == 0 {
        return Ok(0);
    }
    mul_div(shares, pool.total_assets, pool.total_shares)
}

/// Safe multiplication then division with floor rounding.
///
/// Computes: floor((value × numerator) / denominator)
/// Uses u128 intermediate to prevent overflow.
pub fn mul_div(value: u64, numerator: u64, denominator: u64) -> Result<u64> {
    if denominator == 0 {
        return Err(VaultError::DivisionByZero);
    }

    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?;

    let result = product / (denominator as u128);
    if result > u64::MAX as u128 {
        return Err(VaultError::MathOverflow);
    }
    Ok(result as u64)
}
