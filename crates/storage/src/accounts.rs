//! Account row storage operations.
//!
//! Owns every mutation of the `accounts` table and keeps the `codes`
//! index consistent with it: the index entry for a code is written in the
//! same transaction as the row that owns it. Conditional writes
//! (`assign_code_if_absent`, `try_mark_redeemed`) evaluate their
//! condition inside the open write transaction, which redb serializes
//! against all other writers.

use std::sync::Arc;

use chrono::Utc;
use redb::{Database, ReadableTable, Table};
use snafu::ResultExt;

use referral_ledger_types::{
    AccountId, LeaderboardEntry, ReferralAccount, ReferralCode, decode, encode,
};

use crate::error::{
    CodecSnafu, CommitSnafu, CorruptionSnafu, Result, StorageSnafu, TableSnafu, TransactionSnafu,
};
use crate::tables::Tables;

/// Outcome of a set-if-absent code assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeAssignment {
    /// The code was stored and indexed for this account.
    Assigned,
    /// The account already had a code; nothing was written except a
    /// display-name refresh. Carries the existing code.
    AlreadySet(ReferralCode),
    /// Another account already owns this exact code; nothing was written.
    CodeTaken,
}

/// Store for [`ReferralAccount`] rows and the code index.
pub struct AccountStore {
    db: Arc<Database>,
}

impl AccountStore {
    /// Create a new account store backed by the given database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns an account row by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read transaction fails, or a codec
    /// error if the stored row does not decode.
    pub fn load(&self, id: AccountId) -> Result<Option<ReferralAccount>> {
        let txn = self.db.begin_read().context(TransactionSnafu)?;
        let accounts = txn.open_table(Tables::ACCOUNTS).context(TableSnafu)?;
        match accounts.get(id.value()).context(StorageSnafu)? {
            Some(data) => {
                let account = decode(data.value()).context(CodecSnafu)?;
                Ok(Some(account))
            },
            None => Ok(None),
        }
    }

    /// Loads the account row, creating it implicitly if missing, and
    /// refreshes the stored display name.
    ///
    /// Returns the row as it stands after the refresh.
    pub fn ensure_row(&self, id: AccountId, display_name: &str) -> Result<ReferralAccount> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let account = {
            let mut accounts = txn.open_table(Tables::ACCOUNTS).context(TableSnafu)?;
            let existing = read_account(&accounts, id)?;

            match existing {
                Some(mut account) => {
                    if account.display_name != display_name {
                        account.display_name = display_name.to_string();
                        account.updated_at = Utc::now();
                        write_account(&mut accounts, &account)?;
                    }
                    account
                },
                None => {
                    let account = ReferralAccount::new(id, display_name, Utc::now());
                    write_account(&mut accounts, &account)?;
                    account
                },
            }
        };
        txn.commit().context(CommitSnafu)?;
        Ok(account)
    }

    /// Stores `code` as the account's own code unless one is already set.
    ///
    /// The existing-code check, the collision check against the code
    /// index, the row upsert and the index insert all happen inside a
    /// single write transaction, making this the set-if-absent upsert the
    /// registry builds on. A refused assignment writes nothing (beyond a
    /// display-name refresh when the code was already set).
    pub fn assign_code_if_absent(
        &self,
        id: AccountId,
        display_name: &str,
        code: &ReferralCode,
    ) -> Result<CodeAssignment> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let assignment = {
            let mut accounts = txn.open_table(Tables::ACCOUNTS).context(TableSnafu)?;
            let mut codes = txn.open_table(Tables::CODES).context(TableSnafu)?;

            let now = Utc::now();
            let mut account = match read_account(&accounts, id)? {
                Some(account) => account,
                None => ReferralAccount::new(id, display_name, now),
            };

            if let Some(owned) = account.own_code.clone() {
                if account.display_name != display_name {
                    account.display_name = display_name.to_string();
                    account.updated_at = now;
                    write_account(&mut accounts, &account)?;
                }
                CodeAssignment::AlreadySet(owned)
            } else if codes.get(code.as_str()).context(StorageSnafu)?.is_some() {
                CodeAssignment::CodeTaken
            } else {
                account.display_name = display_name.to_string();
                account.own_code = Some(code.clone());
                account.updated_at = now;
                write_account(&mut accounts, &account)?;
                codes.insert(code.as_str(), id.value()).context(StorageSnafu)?;
                CodeAssignment::Assigned
            }
        };
        txn.commit().context(CommitSnafu)?;
        Ok(assignment)
    }

    /// Resolves the account owning a code through the code index.
    pub fn owner_of(&self, code: &ReferralCode) -> Result<Option<AccountId>> {
        let txn = self.db.begin_read().context(TransactionSnafu)?;
        let codes = txn.open_table(Tables::CODES).context(TableSnafu)?;
        let owner = codes.get(code.as_str()).context(StorageSnafu)?.map(|v| AccountId::new(v.value()));
        Ok(owner)
    }

    /// Increments the referrer's usage count by one as a relative update
    /// inside a single write transaction, and returns the new count.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corruption` if the row is missing: callers
    /// resolve the id through the code index first, so a vanished row
    /// means the index and the table disagree.
    pub fn increment_usage(&self, id: AccountId) -> Result<u64> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let new_count = {
            let mut accounts = txn.open_table(Tables::ACCOUNTS).context(TableSnafu)?;
            let mut account = read_account(&accounts, id)?.ok_or_else(|| {
                CorruptionSnafu { message: format!("code index points at missing account {id}") }
                    .build()
            })?;
            account.usage_count += 1;
            account.updated_at = Utc::now();
            write_account(&mut accounts, &account)?;
            account.usage_count
        };
        txn.commit().context(CommitSnafu)?;
        Ok(new_count)
    }

    /// Records the caller's one-time redemption if it has not happened
    /// yet.
    ///
    /// Returns `true` when this call performed the absent-to-present
    /// transition, `false` when the row already carried a redeemed code;
    /// in the latter case nothing is written. The check and the write
    /// share one write transaction, giving conditional-update semantics.
    pub fn try_mark_redeemed(
        &self,
        id: AccountId,
        display_name: &str,
        code: &ReferralCode,
    ) -> Result<bool> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let claimed = {
            let mut accounts = txn.open_table(Tables::ACCOUNTS).context(TableSnafu)?;
            let now = Utc::now();
            let mut account =
                read_account(&accounts, id)?.unwrap_or_else(|| ReferralAccount::new(id, display_name, now));
            if account.has_redeemed() {
                false
            } else {
                account.display_name = display_name.to_string();
                account.redeemed_code = Some(code.clone());
                account.updated_at = now;
                write_account(&mut accounts, &account)?;
                true
            }
        };
        txn.commit().context(CommitSnafu)?;
        Ok(claimed)
    }

    /// Returns the usage count for an account, or `None` if it has no
    /// row.
    pub fn usage_count(&self, id: AccountId) -> Result<Option<u64>> {
        Ok(self.load(id)?.map(|a| a.usage_count))
    }

    /// Returns up to `limit` accounts ordered by usage count descending.
    ///
    /// Ties keep storage order (ascending account id). The limit is a
    /// query parameter, never interpolated into anything.
    pub fn top_by_usage(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let txn = self.db.begin_read().context(TransactionSnafu)?;
        let accounts = txn.open_table(Tables::ACCOUNTS).context(TableSnafu)?;

        let mut entries = Vec::new();
        for item in accounts.iter().context(StorageSnafu)? {
            let (_, value) = item.context(StorageSnafu)?;
            let account: ReferralAccount = decode(value.value()).context(CodecSnafu)?;
            entries.push(LeaderboardEntry {
                display_name: account.display_name,
                usage_count: account.usage_count,
            });
        }

        // Stable sort keeps key order within equal counts.
        entries.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        entries.truncate(limit);
        Ok(entries)
    }
}

impl Clone for AccountStore {
    fn clone(&self) -> Self {
        Self { db: Arc::clone(&self.db) }
    }
}

fn read_account(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: AccountId,
) -> Result<Option<ReferralAccount>> {
    match table.get(id.value()).context(StorageSnafu)? {
        Some(data) => {
            let account = decode(data.value()).context(CodecSnafu)?;
            Ok(Some(account))
        },
        None => Ok(None),
    }
}

fn write_account(
    table: &mut Table<'_, u64, &'static [u8]>,
    account: &ReferralAccount,
) -> Result<()> {
    let encoded = encode(account).context(CodecSnafu)?;
    table.insert(account.id.value(), encoded.as_slice()).context(StorageSnafu)?;
    Ok(())
}
