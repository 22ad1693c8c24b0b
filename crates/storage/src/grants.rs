//! Grant audit log.
//!
//! Append-only record of every credit delta this subsystem applies, live
//! or persisted. Flat and threshold bonuses arrive as separate appends,
//! so the two-step amounts stay auditable. Records are keyed by a
//! sequence counter allocated from the `sequences` table inside the same
//! transaction as the append.

use std::sync::Arc;

use redb::{Database, ReadableTable};
use snafu::ResultExt;

use referral_ledger_types::{AccountId, CreditGrant, decode, encode};

use crate::error::{CodecSnafu, CommitSnafu, Result, StorageSnafu, TableSnafu, TransactionSnafu};
use crate::tables::{GRANT_SEQ_KEY, Tables};

/// Append-only store for [`CreditGrant`] audit records.
pub struct GrantLog {
    db: Arc<Database>,
}

impl GrantLog {
    /// Create a new grant log backed by the given database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Appends a grant record and returns its sequence number.
    pub fn append(&self, grant: &CreditGrant) -> Result<u64> {
        let encoded = encode(grant).context(CodecSnafu)?;

        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let seq = {
            let mut sequences = txn.open_table(Tables::SEQUENCES).context(TableSnafu)?;
            let seq = sequences
                .get(GRANT_SEQ_KEY)
                .context(StorageSnafu)?
                .map(|v| v.value())
                .unwrap_or(0);
            sequences.insert(GRANT_SEQ_KEY, seq + 1).context(StorageSnafu)?;

            let mut grants = txn.open_table(Tables::GRANTS).context(TableSnafu)?;
            grants.insert(seq, encoded.as_slice()).context(StorageSnafu)?;
            seq
        };
        txn.commit().context(CommitSnafu)?;
        Ok(seq)
    }

    /// Returns up to `limit` records in append order.
    pub fn scan(&self, limit: usize) -> Result<Vec<CreditGrant>> {
        let txn = self.db.begin_read().context(TransactionSnafu)?;
        let grants = txn.open_table(Tables::GRANTS).context(TableSnafu)?;

        let mut records = Vec::new();
        for item in grants.iter().context(StorageSnafu)? {
            if records.len() >= limit {
                break;
            }
            let (_, value) = item.context(StorageSnafu)?;
            let grant = decode(value.value()).context(CodecSnafu)?;
            records.push(grant);
        }
        Ok(records)
    }

    /// Returns every record naming the given account, in append order.
    pub fn for_account(&self, id: AccountId) -> Result<Vec<CreditGrant>> {
        let txn = self.db.begin_read().context(TransactionSnafu)?;
        let grants = txn.open_table(Tables::GRANTS).context(TableSnafu)?;

        let mut records = Vec::new();
        for item in grants.iter().context(StorageSnafu)? {
            let (_, value) = item.context(StorageSnafu)?;
            let grant: CreditGrant = decode(value.value()).context(CodecSnafu)?;
            if grant.account == id {
                records.push(grant);
            }
        }
        Ok(records)
    }
}

impl Clone for GrantLog {
    fn clone(&self) -> Self {
        Self { db: Arc::clone(&self.db) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use chrono::Utc;
    use referral_ledger_types::GrantReason;

    use super::*;
    use crate::engine::InMemoryStorageEngine;

    fn grant(account: u64, amount: i64, reason: GrantReason) -> CreditGrant {
        CreditGrant { account: AccountId::new(account), amount, reason, granted_at: Utc::now() }
    }

    #[test]
    fn test_append_allocates_increasing_sequences() {
        let engine = InMemoryStorageEngine::open().expect("open engine");
        let log = GrantLog::new(engine.db());

        let first = log.append(&grant(1, 100, GrantReason::RefereeBonus)).expect("append");
        let second = log.append(&grant(2, 100, GrantReason::ReferrerBonus)).expect("append");
        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[test]
    fn test_scan_returns_append_order() {
        let engine = InMemoryStorageEngine::open().expect("open engine");
        let log = GrantLog::new(engine.db());

        log.append(&grant(1, 100, GrantReason::RefereeBonus)).expect("append");
        log.append(&grant(2, 100, GrantReason::ReferrerBonus)).expect("append");
        log.append(&grant(2, 1000, GrantReason::ThresholdBonus)).expect("append");

        let records = log.scan(10).expect("scan");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].reason, GrantReason::RefereeBonus);
        assert_eq!(records[2].amount, 1000);

        let bounded = log.scan(2).expect("scan bounded");
        assert_eq!(bounded.len(), 2);
    }

    #[test]
    fn test_for_account_filters() {
        let engine = InMemoryStorageEngine::open().expect("open engine");
        let log = GrantLog::new(engine.db());

        log.append(&grant(1, 100, GrantReason::RefereeBonus)).expect("append");
        log.append(&grant(2, 100, GrantReason::ReferrerBonus)).expect("append");
        log.append(&grant(2, 1000, GrantReason::ThresholdBonus)).expect("append");

        let for_two = log.for_account(AccountId::new(2)).expect("filter");
        assert_eq!(for_two.len(), 2);
        assert!(for_two.iter().all(|g| g.account == AccountId::new(2)));
    }
}
