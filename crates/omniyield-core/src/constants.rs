/// Smallest unit of the underlying asset. 1 CSPR = 10^9 motes.
pub const MOTES_PER_CSPR: u64 = 1_000_000_000;

/// Fixed-point denominator for the scaled share price.
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Minimum deposit accepted by the vault (1 CSPR).
pub const DEFAULT_MIN_DEPOSIT: u64 = MOTES_PER_CSPR;

/// Motes a depositor must keep back for gas when depositing.
pub const GAS_RESERVE: u64 = MOTES_PER_CSPR;

/// Journal keeps at most this many records; oldest evicted first.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 100;
