//! OmniYield dashboard client core.
//!
//! Async orchestration over `omniyield-core`: the wallet session state
//! machine, the vault ledger service, status polling, and the collaborator
//! abstractions (wallet provider, vault backend, key-value store) with a
//! randomized simulation backing them for the demo dashboard.

pub mod backend;
pub mod config;
pub mod error;
pub mod ledger;
pub mod poller;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod sim;
pub mod store;

pub use config::{Config, Network};
pub use error::{ClientError, ConnectError};
pub use ledger::{DepositOutcome, VaultLedger, WithdrawOutcome};
pub use poller::StatusPoller;
pub use provider::{WalletAccount, WalletProvider};
pub use session::{SessionState, WalletSession};
