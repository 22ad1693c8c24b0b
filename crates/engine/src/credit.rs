//! Credit dispatch.
//!
//! One polymorphic grant capability with two variants: through a live
//! session handle, or as an additive update on the persisted balance
//! record. The variant is selected once per grant by a session lookup,
//! so the redemption engine never branches on reachability itself.
//! Every applied delta is appended to the grant audit log.

use std::sync::Arc;

use chrono::Utc;
use redb::Database;
use snafu::ResultExt;
use tracing::{debug, warn};

use referral_ledger_storage::{BalanceStore, GrantLog};
use referral_ledger_types::{AccountId, CreditGrant, GrantReason};

use crate::error::{Result, StoreSnafu};
use crate::session::{LiveHandle, SessionRegistry};

/// Delivery path for one credit grant.
pub enum CreditSink {
    /// The account has a reachable session; the grant goes through it.
    Live(Arc<dyn LiveHandle>),
    /// No session; the grant mutates the persisted balance record.
    Persisted,
}

/// Applies credit grants through the appropriate sink.
pub struct CreditDispatcher {
    balances: BalanceStore,
    audit: GrantLog,
    sessions: Arc<SessionRegistry>,
}

impl CreditDispatcher {
    /// Creates a dispatcher over the given database and session registry.
    pub fn new(db: Arc<Database>, sessions: Arc<SessionRegistry>) -> Self {
        Self { balances: BalanceStore::new(Arc::clone(&db)), audit: GrantLog::new(db), sessions }
    }

    /// Selects the delivery path for an account.
    pub fn sink_for(&self, id: AccountId) -> CreditSink {
        match self.sessions.find(id) {
            Some(handle) => CreditSink::Live(handle),
            None => CreditSink::Persisted,
        }
    }

    /// Grants `amount` credits to the account.
    ///
    /// A live handle that fails does not fail the grant; delivery falls
    /// back to the persisted balance. The grant is recorded in the audit
    /// log exactly once either way.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the persisted write or the audit append
    /// fails.
    pub fn grant(&self, id: AccountId, amount: i64, reason: GrantReason) -> Result<()> {
        match self.sink_for(id) {
            CreditSink::Live(handle) => match handle.grant_credits(amount) {
                Ok(()) => {
                    debug!(account = %id, amount, ?reason, "granted credits via live session");
                },
                Err(e) => {
                    warn!(
                        account = %id,
                        amount,
                        error = %e,
                        "live grant failed, falling back to persisted balance"
                    );
                    self.balances.credit(id, amount).context(StoreSnafu)?;
                },
            },
            CreditSink::Persisted => {
                self.balances.credit(id, amount).context(StoreSnafu)?;
                debug!(account = %id, amount, ?reason, "granted credits to persisted balance");
            },
        }

        self.audit
            .append(&CreditGrant { account: id, amount, reason, granted_at: Utc::now() })
            .context(StoreSnafu)?;
        Ok(())
    }
}
