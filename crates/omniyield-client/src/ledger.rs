//! The vault ledger service.
//!
//! Owns pool aggregates, the depositor position, the transaction journal,
//! and the yield/allocation histories. All mutation goes through the
//! methods here; the UI layer only reads snapshots and subscribes to
//! events.
//!
//! Refresh deliberately carries no per-entity sequence token: a refresh
//! response that lands after a concurrent deposit overwrites the pool with
//! its snapshot, matching the upstream dashboard's behavior.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use omniyield_core::events::VaultEvent;
use omniyield_core::ledger::Ledger;
use omniyield_core::{
    math, Allocation, PoolStats, Strategy, TransactionJournal, TransactionRecord, TxKind,
    TxStatus, VaultError, VaultPool, YieldEvent,
};

use crate::backend::{chain_name, Finality, VaultBackend};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::session::WalletSession;
use crate::store::{self, KvStore, KEY_TRANSACTION_JOURNAL};

#[derive(Debug, Clone)]
pub struct DepositOutcome {
    pub shares: u64,
    pub record: TransactionRecord,
}

#[derive(Debug, Clone)]
pub struct WithdrawOutcome {
    pub amount: u64,
    pub record: TransactionRecord,
}

struct LedgerState {
    ledger: Ledger,
    stats: Option<PoolStats>,
    journal: TransactionJournal,
    yield_history: Vec<YieldEvent>,
    allocations: Vec<Allocation>,
    strategies: Vec<Strategy>,
    token_balance: u64,
}

/// Cheaply cloneable handle to the vault ledger.
#[derive(Clone)]
pub struct VaultLedger {
    state: Arc<RwLock<LedgerState>>,
    backend: Arc<dyn VaultBackend>,
    session: WalletSession,
    store: Arc<dyn KvStore>,
    events: broadcast::Sender<VaultEvent>,
    config: Config,
}

impl VaultLedger {
    pub fn new(
        session: WalletSession,
        backend: Arc<dyn VaultBackend>,
        store: Arc<dyn KvStore>,
        events: broadcast::Sender<VaultEvent>,
        config: Config,
    ) -> Self {
        let records: Vec<TransactionRecord> =
            store::load(store.as_ref(), KEY_TRANSACTION_JOURNAL).unwrap_or_default();
        let journal = TransactionJournal::from_records(config.journal_capacity, records);

        Self {
            state: Arc::new(RwLock::new(LedgerState {
                ledger: Ledger::default(),
                stats: None,
                journal,
                yield_history: Vec::new(),
                allocations: Vec::new(),
                strategies: Vec::new(),
                token_balance: 0,
            })),
            backend,
            session,
            store,
            events,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }

    pub fn pool(&self) -> VaultPool {
        self.state.read().unwrap().ledger.pool
    }

    pub fn position_shares(&self) -> u64 {
        self.state.read().unwrap().ledger.position.shares
    }

    pub fn stats(&self) -> Option<PoolStats> {
        self.state.read().unwrap().stats
    }

    pub fn token_balance(&self) -> u64 {
        self.state.read().unwrap().token_balance
    }

    pub fn yield_history(&self) -> Vec<YieldEvent> {
        self.state.read().unwrap().yield_history.clone()
    }

    pub fn allocations(&self) -> Vec<Allocation> {
        self.state.read().unwrap().allocations.clone()
    }

    pub fn strategies(&self) -> Vec<Strategy> {
        self.state.read().unwrap().strategies.clone()
    }

    pub fn journal_records(&self) -> Vec<TransactionRecord> {
        self.state.read().unwrap().journal.records().cloned().collect()
    }

    pub fn export_journal_csv(&self) -> String {
        self.state.read().unwrap().journal.export_csv()
    }

    /// Shares a deposit of `amount` would mint at the current pool ratio.
    pub fn preview_deposit(&self, amount: u64) -> Result<u64> {
        let pool = self.pool();
        Ok(math::shares_for_deposit(amount, &pool)?)
    }

    /// Motes a withdrawal of `shares` would return at the current ratio.
    pub fn preview_withdraw(&self, shares: u64) -> Result<u64> {
        let pool = self.pool();
        Ok(math::amount_for_withdraw(shares, &pool)?)
    }

    /// Deposit `amount` motes into the vault.
    ///
    /// All validation happens before the backend submission, so a failed
    /// deposit mutates nothing and appends no journal record.
    pub async fn deposit(&self, amount: u64) -> Result<DepositOutcome> {
        let account = self.session.account().ok_or(ClientError::NotConnected)?;

        if amount == 0 {
            return Err(VaultError::InvalidAmount.into());
        }
        if amount < self.config.min_deposit {
            return Err(VaultError::DepositTooSmall {
                min: self.config.min_deposit,
            }
            .into());
        }
        let wallet_balance = self.session.balance();
        if amount.saturating_add(self.config.gas_reserve) > wallet_balance {
            return Err(VaultError::InsufficientBalance.into());
        }
        let pool = self.pool();
        if math::shares_for_deposit(amount, &pool)? == 0 {
            // would absorb the motes without minting a claim
            return Err(VaultError::DepositTooSmall {
                min: pool.total_assets / pool.total_shares + 1,
            }
            .into());
        }

        let receipt = self
            .backend
            .submit_deposit(&account, amount)
            .await
            .map_err(|err| ClientError::BackendUnavailable(err.to_string()))?;

        let now = Utc::now();
        let record = {
            let mut state = self.state.write().unwrap();
            let shares = state.ledger.apply_deposit(amount, now)?;
            let mut record =
                TransactionRecord::new(TxKind::Deposit, amount, shares, receipt.external_ref, now);
            state.journal.append(record.clone());
            if receipt.finality == Finality::Immediate {
                state.journal.resolve(record.id, TxStatus::Confirmed);
                record.status = TxStatus::Confirmed;
            }
            self.persist_journal(&state.journal);
            record
        };

        info!(amount, shares = record.shares, external_ref = %record.external_ref, "deposit submitted");
        let _ = self.events.send(VaultEvent::Deposited {
            amount,
            shares: record.shares,
            external_ref: record.external_ref.clone(),
        });

        if let Err(err) = self.refresh().await {
            debug!(error = %err, "post-deposit refresh failed");
        }

        Ok(DepositOutcome {
            shares: record.shares,
            record,
        })
    }

    /// Redeem `shares` from the vault.
    pub async fn withdraw(&self, shares: u64) -> Result<WithdrawOutcome> {
        let account = self.session.account().ok_or(ClientError::NotConnected)?;

        if shares == 0 {
            return Err(VaultError::InvalidAmount.into());
        }
        {
            let state = self.state.read().unwrap();
            if shares > state.ledger.position.shares {
                return Err(VaultError::InsufficientShares.into());
            }
            if math::amount_for_withdraw(shares, &state.ledger.pool)? == 0 {
                return Err(VaultError::WithdrawTooSmall.into());
            }
        }

        let receipt = self
            .backend
            .submit_withdraw(&account, shares)
            .await
            .map_err(|err| ClientError::BackendUnavailable(err.to_string()))?;

        let now = Utc::now();
        let record = {
            let mut state = self.state.write().unwrap();
            let amount = state.ledger.apply_withdraw(shares, now)?;
            let mut record =
                TransactionRecord::new(TxKind::Withdraw, amount, shares, receipt.external_ref, now);
            state.journal.append(record.clone());
            if receipt.finality == Finality::Immediate {
                state.journal.resolve(record.id, TxStatus::Confirmed);
                record.status = TxStatus::Confirmed;
            }
            self.persist_journal(&state.journal);
            record
        };

        info!(shares, amount = record.amount, external_ref = %record.external_ref, "withdrawal submitted");
        let _ = self.events.send(VaultEvent::Withdrawn {
            amount: record.amount,
            shares,
            external_ref: record.external_ref.clone(),
        });

        if let Err(err) = self.refresh().await {
            debug!(error = %err, "post-withdraw refresh failed");
        }

        Ok(WithdrawOutcome {
            amount: record.amount,
            record,
        })
    }

    /// Re-derive pool aggregates, position, and histories from the backend.
    ///
    /// Idempotent. A backend failure is non-fatal: the last-known-good
    /// state is retained and `BackendUnavailable` reported.
    pub async fn refresh(&self) -> Result<()> {
        if !self.session.is_connected() {
            return Ok(());
        }
        let account = self.session.account().ok_or(ClientError::NotConnected)?;

        let fetched = tokio::try_join!(
            self.backend.pool_stats(),
            self.backend.position(&account),
            self.backend.token_balance(&account),
            self.backend.yield_history(),
            self.backend.allocations(),
            self.backend.strategies(),
        );
        let (stats, position, token_balance, yield_history, allocations, strategies) =
            match fetched {
                Ok(parts) => parts,
                Err(err) => {
                    warn!(error = %err, "vault refresh failed, keeping last-known state");
                    return Err(ClientError::BackendUnavailable(err.to_string()));
                }
            };

        {
            let mut state = self.state.write().unwrap();
            state.ledger.pool = stats.pool;
            state.ledger.position.shares = position.shares;
            state.ledger.position.last_action_at = position.last_action_at;
            state.stats = Some(stats);
            state.token_balance = token_balance;
            state.yield_history = bounded(yield_history, self.config.yield_history_limit);
            state.allocations = bounded(allocations, self.config.allocation_limit);
            state.strategies = strategies;
        }

        let _ = self.events.send(VaultEvent::PoolRefreshed {
            total_assets: stats.pool.total_assets,
            total_shares: stats.pool.total_shares,
        });
        Ok(())
    }

    /// Allocate pooled funds to a strategy on another chain.
    pub async fn allocate(
        &self,
        chain_id: u32,
        amount: u64,
        strategy: &str,
    ) -> Result<Allocation> {
        let account = self.session.account().ok_or(ClientError::NotConnected)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount.into());
        }

        self.backend
            .submit_allocation(&account, chain_id, amount, strategy)
            .await
            .map_err(|err| ClientError::BackendUnavailable(err.to_string()))?;

        let allocation = Allocation {
            chain_id,
            chain_name: chain_name(chain_id).to_string(),
            amount,
            strategy: strategy.to_string(),
            created_at: Utc::now(),
        };
        {
            let mut state = self.state.write().unwrap();
            state.allocations.insert(0, allocation.clone());
            state.allocations.truncate(self.config.allocation_limit);
        }

        info!(chain_id, amount, strategy, "cross-chain allocation recorded");
        let _ = self.events.send(VaultEvent::AllocationAdded {
            chain_id,
            amount,
            strategy: strategy.to_string(),
        });
        Ok(allocation)
    }

    /// Trigger a simulated yield accrual and record the event.
    pub async fn accrue_yield(&self) -> Result<YieldEvent> {
        let account = self.session.account().ok_or(ClientError::NotConnected)?;

        let event = self
            .backend
            .simulate_yield(&account)
            .await
            .map_err(|err| ClientError::BackendUnavailable(err.to_string()))?;

        {
            let mut state = self.state.write().unwrap();
            state.yield_history.insert(0, event.clone());
            state.yield_history.truncate(self.config.yield_history_limit);
        }

        let _ = self.events.send(VaultEvent::YieldAccrued {
            amount: event.amount,
            source: event.source.clone(),
        });
        Ok(event)
    }

    /// Periodic refresh scoped to the returned token; cancel to stop.
    pub fn spawn_auto_refresh(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let ledger = self.clone();
        let guard = token.clone();
        let interval = self.config.pool_refresh_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = ledger.refresh().await {
                            debug!(error = %err, "periodic refresh failed");
                        }
                    }
                }
            }
            debug!("auto refresh task stopped");
        });
        token
    }

    // -- status poller support -------------------------------------------

    pub(crate) fn pending_records(&self) -> Vec<(Uuid, String)> {
        self.state
            .read()
            .unwrap()
            .journal
            .pending()
            .map(|r| (r.id, r.external_ref.clone()))
            .collect()
    }

    pub(crate) fn note_poll_attempt(&self, id: Uuid) -> Option<u32> {
        self.state.write().unwrap().journal.note_poll_attempt(id)
    }

    pub(crate) fn resolve_record(&self, id: Uuid, status: TxStatus) -> bool {
        let resolved = {
            let mut state = self.state.write().unwrap();
            let resolved = state.journal.resolve(id, status);
            if resolved {
                self.persist_journal(&state.journal);
            }
            resolved
        };
        if resolved {
            let _ = self
                .events
                .send(VaultEvent::StatusResolved { record: id, status });
        }
        resolved
    }

    fn persist_journal(&self, journal: &TransactionJournal) {
        let records: Vec<TransactionRecord> = journal.records().cloned().collect();
        if let Err(err) = store::save(self.store.as_ref(), KEY_TRANSACTION_JOURNAL, &records) {
            warn!(error = %err, "failed to persist transaction journal");
        }
    }
}

fn bounded<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}
