//! OmniYield vault accounting core.
//!
//! Pure state and arithmetic for the OmniYield cross-chain yield vault:
//! share/asset conversion, pool and depositor bookkeeping, and the bounded
//! transaction journal. No I/O and no async — the `omniyield-client` crate
//! layers collaborators (wallet providers, backends, storage) on top.

pub mod constants;
pub mod display;
pub mod error;
pub mod events;
pub mod journal;
pub mod ledger;
pub mod math;
pub mod state;

pub use error::VaultError;
pub use journal::{TransactionJournal, TransactionRecord, TxKind, TxStatus};
pub use ledger::Ledger;
pub use state::{Allocation, DepositorPosition, PoolStats, RiskLevel, Strategy, VaultPool, YieldEvent};
