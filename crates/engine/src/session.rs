//! Live session registry.
//!
//! Adapters attach a [`LiveHandle`] when an account connects and detach
//! it on disconnect. The credit dispatcher consults this registry once
//! per grant to decide between the live and persisted delivery paths.

use std::sync::Arc;

use dashmap::DashMap;
use snafu::Snafu;

use referral_ledger_types::AccountId;

/// Error delivering a grant through a live handle.
#[derive(Debug, Snafu)]
pub enum SessionError {
    /// The handle could not apply the grant.
    #[snafu(display("live grant to {account} failed: {message}"))]
    GrantFailed {
        /// Account the grant was addressed to.
        account: AccountId,
        /// Adapter-supplied failure description.
        message: String,
    },
}

/// A reachable, currently-connected representation of an account.
///
/// Implementations are expected to route credits to the same balance
/// store the persisted path writes, so both paths converge on disk.
pub trait LiveHandle: Send + Sync {
    /// The account this handle belongs to.
    fn account_id(&self) -> AccountId;

    /// Applies a credit grant through the live session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::GrantFailed`] when the session cannot
    /// apply the grant; the dispatcher then falls back to the persisted
    /// path.
    fn grant_credits(&self, amount: i64) -> Result<(), SessionError>;
}

/// Registry of currently reachable sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<AccountId, Arc<dyn LiveHandle>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { sessions: DashMap::new() }
    }

    /// Registers a live handle, replacing any previous handle for the
    /// same account.
    pub fn attach(&self, handle: Arc<dyn LiveHandle>) {
        self.sessions.insert(handle.account_id(), handle);
    }

    /// Removes the handle for an account. Returns whether one existed.
    pub fn detach(&self, id: AccountId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Returns the live handle for an account, if currently connected.
    pub fn find(&self, id: AccountId) -> Option<Arc<dyn LiveHandle>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of connected sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
