//! Asynchronous status resolution for pending journal records.
//!
//! Pending records are swept on a fixed interval and their external
//! references queried concurrently. A record that stays pending past the
//! attempt budget is marked failed rather than left pending forever.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use omniyield_core::TxStatus;

use crate::backend::StatusSource;
use crate::config::Config;
use crate::ledger::VaultLedger;

pub struct StatusPoller {
    ledger: VaultLedger,
    source: Arc<dyn StatusSource>,
    interval: Duration,
    max_attempts: u32,
}

impl StatusPoller {
    pub fn new(ledger: VaultLedger, source: Arc<dyn StatusSource>, config: &Config) -> Self {
        Self {
            ledger,
            source,
            interval: config.status_poll_interval,
            max_attempts: config.status_poll_attempts,
        }
    }

    /// One polling pass over all pending records.
    pub async fn sweep(&self) {
        let pending = self.ledger.pending_records();
        if pending.is_empty() {
            return;
        }

        let lookups = pending.into_iter().map(|(id, external_ref)| {
            let source = Arc::clone(&self.source);
            async move { (id, source.status(&external_ref).await) }
        });

        for (id, outcome) in join_all(lookups).await {
            let status = match outcome {
                Ok(status) => status,
                Err(err) => {
                    warn!(record = %id, error = %err, "status lookup failed");
                    TxStatus::Pending
                }
            };

            match status {
                TxStatus::Confirmed | TxStatus::Failed => {
                    self.ledger.resolve_record(id, status);
                    debug!(record = %id, ?status, "transaction resolved");
                }
                TxStatus::Pending => {
                    if let Some(attempts) = self.ledger.note_poll_attempt(id) {
                        if attempts >= self.max_attempts {
                            warn!(record = %id, attempts, "poll budget exhausted, marking failed");
                            self.ledger.resolve_record(id, TxStatus::Failed);
                        }
                    }
                }
            }
        }
    }

    /// Run sweeps on the configured interval until the token is cancelled.
    pub fn spawn(self) -> CancellationToken {
        let token = CancellationToken::new();
        let guard = token.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,
                    _ = ticker.tick() => self.sweep().await,
                }
            }
            debug!("status poller stopped");
        });
        token
    }
}
