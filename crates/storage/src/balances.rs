//! Persisted balance storage.
//!
//! The offline half of the wallet capability: a balance record per
//! account that the credit dispatcher mutates additively when no live
//! session can receive the grant. Live handles route to the same table,
//! so both paths converge to identical on-disk state.

use std::sync::Arc;

use redb::{Database, ReadableTable};
use snafu::ResultExt;

use referral_ledger_types::AccountId;

use crate::error::{CommitSnafu, Result, StorageSnafu, TableSnafu, TransactionSnafu};
use crate::tables::Tables;

/// Store for persisted credit balances.
pub struct BalanceStore {
    db: Arc<Database>,
}

impl BalanceStore {
    /// Create a new balance store backed by the given database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Applies `balance += amount` for the account and returns the new
    /// balance.
    ///
    /// The read and the write share one write transaction, so the update
    /// is relative: concurrent credits cannot lose each other.
    pub fn credit(&self, id: AccountId, amount: i64) -> Result<i64> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let new_balance = {
            let mut balances = txn.open_table(Tables::BALANCES).context(TableSnafu)?;
            let current = balances
                .get(id.value())
                .context(StorageSnafu)?
                .map(|v| v.value())
                .unwrap_or(0);
            let new_balance = current + amount;
            balances.insert(id.value(), new_balance).context(StorageSnafu)?;
            new_balance
        };
        txn.commit().context(CommitSnafu)?;
        Ok(new_balance)
    }

    /// Returns the account's persisted balance, zero if absent.
    pub fn balance(&self, id: AccountId) -> Result<i64> {
        let txn = self.db.begin_read().context(TransactionSnafu)?;
        let balances = txn.open_table(Tables::BALANCES).context(TableSnafu)?;
        let balance =
            balances.get(id.value()).context(StorageSnafu)?.map(|v| v.value()).unwrap_or(0);
        Ok(balance)
    }
}

impl Clone for BalanceStore {
    fn clone(&self) -> Self {
        Self { db: Arc::clone(&self.db) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::engine::InMemoryStorageEngine;

    #[test]
    fn test_credit_is_additive() {
        let engine = InMemoryStorageEngine::open().expect("open engine");
        let store = BalanceStore::new(engine.db());
        let id = AccountId::new(1);

        assert_eq!(store.balance(id).expect("balance"), 0);
        assert_eq!(store.credit(id, 100).expect("credit"), 100);
        assert_eq!(store.credit(id, 1000).expect("credit"), 1100);
        assert_eq!(store.balance(id).expect("balance"), 1100);
    }

    #[test]
    fn test_accounts_are_independent() {
        let engine = InMemoryStorageEngine::open().expect("open engine");
        let store = BalanceStore::new(engine.db());

        store.credit(AccountId::new(1), 50).expect("credit");
        assert_eq!(store.balance(AccountId::new(2)).expect("balance"), 0);
    }
}
