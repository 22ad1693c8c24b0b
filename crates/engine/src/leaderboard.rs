//! Read-only queries over accumulated usage counts.

use snafu::ResultExt;

use referral_ledger_storage::AccountStore;
use referral_ledger_types::{AccountId, LeaderboardEntry, MAX_TOP_LIMIT};

use crate::error::{Result, StoreSnafu};

/// Read-only view of referrer standings.
pub struct LeaderboardReader {
    accounts: AccountStore,
}

impl LeaderboardReader {
    /// Creates a reader over the given account store.
    pub fn new(accounts: AccountStore) -> Self {
        Self { accounts }
    }

    /// Returns up to `limit` referrers ordered by usage count descending,
    /// ties in storage order.
    ///
    /// The limit is capped at [`MAX_TOP_LIMIT`] and passed to storage as
    /// a query parameter.
    pub fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit.min(MAX_TOP_LIMIT);
        self.accounts.top_by_usage(limit).context(StoreSnafu)
    }

    /// Returns the account's usage count, or `None` if it has no row.
    pub fn usage_count(&self, id: AccountId) -> Result<Option<u64>> {
        self.accounts.usage_count(id).context(StoreSnafu)
    }
}
