//! Notifications emitted by vault and session operations.

use serde::Serialize;
use uuid::Uuid;

use crate::journal::TxStatus;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    Deposited {
        amount: u64,
        shares: u64,
        external_ref: String,
    },
    Withdrawn {
        amount: u64,
        shares: u64,
        external_ref: String,
    },
    PoolRefreshed {
        total_assets: u64,
        total_shares: u64,
    },
    YieldAccrued {
        amount: u64,
        source: String,
    },
    AllocationAdded {
        chain_id: u32,
        amount: u64,
        strategy: String,
    },
    StatusResolved {
        record: Uuid,
        status: TxStatus,
    },
    SessionConnected {
        public_key: String,
    },
    SessionDisconnected,
}
