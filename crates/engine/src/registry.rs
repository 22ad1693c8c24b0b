//! Referral code registry.
//!
//! Owns the lazily-created, stable-once-set code of each account. The
//! check-then-generate sequence runs under the account's critical
//! section, and the persistence step is a set-if-absent upsert, so
//! concurrent calls from one account always observe the same code.

use std::sync::Arc;

use snafu::ResultExt;
use tracing::{debug, warn};

use referral_ledger_storage::{AccountStore, CodeAssignment};
use referral_ledger_types::{AccountId, ReferralCode};

use crate::codegen::CodeGenerator;
use crate::error::{CodeSpaceExhaustedSnafu, Result, StoreSnafu};
use crate::locks::AccountLocks;

/// Upper bound on regeneration after code collisions.
///
/// 36^8 codes make a collision vanishingly rare; the bound exists so a
/// degenerate seed or a nearly full code space surfaces as an error
/// instead of a spin.
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// Registry for per-account referral codes.
pub struct CodeRegistry {
    accounts: AccountStore,
    locks: Arc<AccountLocks>,
    codegen: Arc<CodeGenerator>,
}

impl CodeRegistry {
    /// Creates a registry over the given store, lock map and generator.
    pub fn new(
        accounts: AccountStore,
        locks: Arc<AccountLocks>,
        codegen: Arc<CodeGenerator>,
    ) -> Self {
        Self { accounts, locks, codegen }
    }

    /// Returns the account's code, generating and persisting one if it
    /// has none yet.
    ///
    /// An existing code is returned unchanged without invoking
    /// generation. The stored display name is refreshed either way.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CodeSpaceExhausted`](crate::EngineError::CodeSpaceExhausted)
    /// if every generated candidate collided, or a storage error.
    pub fn ensure_own_code(&self, id: AccountId, display_name: &str) -> Result<ReferralCode> {
        let _guard = self.locks.acquire(id);

        let row = self.accounts.ensure_row(id, display_name).context(StoreSnafu)?;
        if let Some(code) = row.own_code {
            return Ok(code);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = self.codegen.generate();
            match self
                .accounts
                .assign_code_if_absent(id, display_name, &candidate)
                .context(StoreSnafu)?
            {
                CodeAssignment::Assigned => {
                    debug!(account = %id, code = %candidate, "assigned referral code");
                    return Ok(candidate);
                },
                CodeAssignment::AlreadySet(existing) => return Ok(existing),
                CodeAssignment::CodeTaken => {
                    warn!(account = %id, attempt, "generated code already taken, regenerating");
                },
            }
        }

        CodeSpaceExhaustedSnafu { attempts: MAX_CODE_ATTEMPTS }.fail()
    }

    /// Returns the account's code without generating one.
    pub fn own_code(&self, id: AccountId) -> Result<Option<ReferralCode>> {
        let row = self.accounts.load(id).context(StoreSnafu)?;
        Ok(row.and_then(|account| account.own_code))
    }
}
