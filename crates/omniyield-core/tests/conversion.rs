//! Property tests for share/asset conversion laws.

use omniyield_core::math::{amount_for_withdraw, shares_for_deposit};
use omniyield_core::state::VaultPool;
use proptest::prelude::*;

const MAX: u64 = 1_000_000_000_000;

// Shares per asset capped at 1000x so minted share counts stay in u64.
fn pool_strategy() -> impl Strategy<Value = VaultPool> {
    (1..=MAX)
        .prop_flat_map(|total_assets| {
            (Just(total_assets), 1..=total_assets.saturating_mul(1_000))
        })
        .prop_map(|(total_assets, total_shares)| VaultPool {
            total_assets,
            total_shares,
        })
}

proptest! {
    #[test]
    fn bootstrap_is_identity(amount in 1..=MAX) {
        let pool = VaultPool { total_assets: 0, total_shares: 0 };
        prop_assert_eq!(shares_for_deposit(amount, &pool).unwrap(), amount);
    }

    /// Depositing then withdrawing under a fixed pool loses at most one
    /// share's worth of motes to floor rounding, and never gains.
    #[test]
    fn round_trip_within_one_rounding_unit(amount in 1..=MAX, pool in pool_strategy()) {
        let shares = shares_for_deposit(amount, &pool).unwrap();
        let back = amount_for_withdraw(shares, &pool).unwrap();
        prop_assert!(back <= amount);
        let unit = pool.total_assets / pool.total_shares + 1;
        prop_assert!(amount - back <= unit);
    }

    #[test]
    fn deposit_is_monotonic(a in 1..MAX, b in 1..=MAX, pool in pool_strategy()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let s_lo = shares_for_deposit(lo, &pool).unwrap();
        let s_hi = shares_for_deposit(hi, &pool).unwrap();
        prop_assert!(s_lo <= s_hi);
    }

    /// Increasing the deposit by at least one full rounding unit strictly
    /// increases the shares minted.
    #[test]
    fn deposit_is_strict_across_a_rounding_unit(a in 1..=MAX, pool in pool_strategy()) {
        let unit = pool.total_assets / pool.total_shares + 1;
        let b = a.saturating_add(unit);
        let s_a = shares_for_deposit(a, &pool).unwrap();
        let s_b = shares_for_deposit(b, &pool).unwrap();
        prop_assert!(s_b > s_a);
    }

    /// Redeeming any fraction of the outstanding shares never pays out more
    /// than the pool holds.
    #[test]
    fn withdraw_is_bounded_by_pool(pool in pool_strategy(), frac in 0u64..=100) {
        let shares = pool.total_shares / 100 * frac;
        let amount = amount_for_withdraw(shares, &pool).unwrap();
        prop_assert!(amount <= pool.total_assets);
    }
}
