//! Bounded, append-only record of user deposit/withdraw actions.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub kind: TxKind,
    /// Motes moved by the action.
    pub amount: u64,
    /// Shares minted or burned.
    pub shares: u64,
    /// Deploy hash or other reference issued by the backend.
    pub external_ref: String,
    pub created_at: DateTime<Utc>,
    pub status: TxStatus,
    /// Number of status polls attempted so far.
    #[serde(default)]
    pub poll_attempts: u32,
}

impl TransactionRecord {
    pub fn new(
        kind: TxKind,
        amount: u64,
        shares: u64,
        external_ref: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            shares,
            external_ref: external_ref.into(),
            created_at,
            status: TxStatus::Pending,
            poll_attempts: 0,
        }
    }
}

/// Capacity-bounded journal, newest record first.
#[derive(Debug, Clone)]
pub struct TransactionJournal {
    capacity: usize,
    entries: VecDeque<TransactionRecord>,
}

impl TransactionJournal {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "journal capacity must be non-zero");
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Rebuild a journal from persisted records (newest first). Records
    /// beyond `capacity` are dropped from the old end.
    pub fn from_records(capacity: usize, records: Vec<TransactionRecord>) -> Self {
        let mut journal = Self::new(capacity);
        journal.entries.extend(records.into_iter().take(capacity));
        journal
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert at the head, evicting the oldest record beyond capacity.
    pub fn append(&mut self, record: TransactionRecord) {
        self.entries.push_front(record);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Resolve a pending record to a terminal status. Returns `true` if the
    /// record existed, was still pending, and the target status is terminal;
    /// terminal records are immutable.
    pub fn resolve(&mut self, id: Uuid, status: TxStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }
        match self.entries.iter_mut().find(|r| r.id == id) {
            Some(record) if record.status == TxStatus::Pending => {
                record.status = status;
                true
            }
            _ => false,
        }
    }

    /// Bump the poll counter for a record, returning the new count.
    pub fn note_poll_attempt(&mut self, id: Uuid) -> Option<u32> {
        let record = self.entries.iter_mut().find(|r| r.id == id)?;
        record.poll_attempts = record.poll_attempts.saturating_add(1);
        Some(record.poll_attempts)
    }

    /// Newest-first view of all records.
    pub fn records(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.entries.iter()
    }

    pub fn pending(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.entries.iter().filter(|r| r.status == TxStatus::Pending)
    }

    pub fn get(&self, id: Uuid) -> Option<&TransactionRecord> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// Serialize the journal to CSV for user download.
    pub fn export_csv(&self) -> String {
        let mut out = String::from("id,kind,amount,shares,timestamp,status,external_ref\n");
        for r in &self.entries {
            let kind = match r.kind {
                TxKind::Deposit => "deposit",
                TxKind::Withdraw => "withdraw",
            };
            let status = match r.status {
                TxStatus::Pending => "pending",
                TxStatus::Confirmed => "confirmed",
                TxStatus::Failed => "failed",
            };
            out.push_str(&format!(
                "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\n",
                r.id,
                kind,
                r.amount,
                r.shares,
                r.created_at.to_rfc3339(),
                status,
                r.external_ref,
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u64) -> TransactionRecord {
        TransactionRecord::new(TxKind::Deposit, n, n, format!("deploy-{n}"), Utc::now())
    }

    #[test]
    fn test_append_is_newest_first() {
        let mut journal = TransactionJournal::new(10);
        journal.append(record(1));
        journal.append(record(2));
        let amounts: Vec<u64> = journal.records().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![2, 1]);
    }

    #[test]
    fn test_capacity_evicts_exactly_the_oldest() {
        let mut journal = TransactionJournal::new(3);
        for n in 1..=4 {
            journal.append(record(n));
        }
        assert_eq!(journal.len(), 3);
        let amounts: Vec<u64> = journal.records().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![4, 3, 2]);
    }

    #[test]
    fn test_resolve_only_from_pending() {
        let mut journal = TransactionJournal::new(10);
        let r = record(1);
        let id = r.id;
        journal.append(r);

        assert!(journal.resolve(id, TxStatus::Confirmed));
        assert_eq!(journal.get(id).unwrap().status, TxStatus::Confirmed);

        // terminal records are immutable
        assert!(!journal.resolve(id, TxStatus::Failed));
        assert_eq!(journal.get(id).unwrap().status, TxStatus::Confirmed);
    }

    #[test]
    fn test_resolve_to_pending_is_rejected() {
        let mut journal = TransactionJournal::new(10);
        let r = record(1);
        let id = r.id;
        journal.append(r);
        assert!(!journal.resolve(id, TxStatus::Pending));
        assert_eq!(journal.get(id).unwrap().status, TxStatus::Pending);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let mut journal = TransactionJournal::new(10);
        assert!(!journal.resolve(Uuid::new_v4(), TxStatus::Confirmed));
    }

    #[test]
    fn test_pending_filter() {
        let mut journal = TransactionJournal::new(10);
        let a = record(1);
        let b = record(2);
        let a_id = a.id;
        journal.append(a);
        journal.append(b);
        journal.resolve(a_id, TxStatus::Confirmed);
        assert_eq!(journal.pending().count(), 1);
    }

    #[test]
    fn test_csv_export_shape() {
        let mut journal = TransactionJournal::new(10);
        journal.append(record(1));
        journal.append(record(2));
        let csv = journal.export_csv();
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,kind,amount"));
        assert!(lines[1].contains("\"deposit\""));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut journal = TransactionJournal::new(5);
        journal.append(record(1));
        let records: Vec<TransactionRecord> = journal.records().cloned().collect();
        let json = serde_json::to_string(&records).unwrap();
        let restored: Vec<TransactionRecord> = serde_json::from_str(&json).unwrap();
        let rebuilt = TransactionJournal::from_records(5, restored);
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(rebuilt.records().next().unwrap().amount, 1);
    }
}
