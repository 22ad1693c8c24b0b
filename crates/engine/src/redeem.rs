//! Redemption engine.
//!
//! Validates and executes a redemption attempt: one-time claim per
//! account, self-referral rejection, usage counting and reward dispatch.
//! The whole step sequence runs under the caller's critical section, so
//! of N concurrent attempts by one account at most one observes the
//! claim open and proceeds to credit a referrer.

use std::sync::Arc;

use snafu::ResultExt;
use tracing::info;

use referral_ledger_storage::{AccountStore, StoreError};
use referral_ledger_types::{
    AccountId, GrantReason, RedeemOutcome, ReferralCode, ReferralConfig,
};

use crate::credit::CreditDispatcher;
use crate::error::{Result, StoreSnafu};
use crate::locks::AccountLocks;

/// Executes redemption attempts.
pub struct RedemptionEngine {
    accounts: AccountStore,
    dispatcher: CreditDispatcher,
    locks: Arc<AccountLocks>,
    config: ReferralConfig,
}

impl RedemptionEngine {
    /// Creates an engine over the given store, dispatcher and lock map.
    pub fn new(
        accounts: AccountStore,
        dispatcher: CreditDispatcher,
        locks: Arc<AccountLocks>,
        config: ReferralConfig,
    ) -> Self {
        Self { accounts, dispatcher, locks, config }
    }

    /// Attempts to redeem `submitted` for the calling account.
    ///
    /// Validation results come back as [`RedeemOutcome`] variants; `Err`
    /// is reserved for storage failures, which abort the remaining
    /// steps. The result is never `Success` unless the terminal
    /// mark-redeemed write committed, though reward grants applied
    /// before a failure are not retracted (accepted at-least-once
    /// delivery).
    pub fn redeem(
        &self,
        id: AccountId,
        display_name: &str,
        submitted: &str,
    ) -> Result<RedeemOutcome> {
        let _guard = self.locks.acquire(id);

        // The caller's row must exist before the claim check; creation is
        // implicit on first interaction and refreshes the display name.
        let caller = self.accounts.ensure_row(id, display_name).context(StoreSnafu)?;
        if caller.has_redeemed() {
            return Ok(RedeemOutcome::AlreadyRedeemed);
        }

        // A string that does not even parse as a code cannot match any
        // stored one.
        let Ok(code) = ReferralCode::parse(submitted) else {
            return Ok(RedeemOutcome::InvalidCode);
        };
        let Some(referrer_id) = self.accounts.owner_of(&code).context(StoreSnafu)? else {
            return Ok(RedeemOutcome::InvalidCode);
        };

        // Compared on owner identity, not on the code string.
        if referrer_id == id {
            return Ok(RedeemOutcome::SelfReferral);
        }

        let referrer = self
            .accounts
            .load(referrer_id)
            .context(StoreSnafu)?
            .ok_or_else(|| {
                StoreError::corruption(format!("code index points at missing account {referrer_id}"))
            })
            .context(StoreSnafu)?;
        let referrer_name = referrer.display_name;

        let new_count = self.accounts.increment_usage(referrer_id).context(StoreSnafu)?;

        let bonus = self.config.referral_bonus;
        self.dispatcher.grant(id, bonus, GrantReason::RefereeBonus)?;

        let threshold_bonus = self.config.threshold_bonus(new_count);

        self.dispatcher.grant(referrer_id, bonus, GrantReason::ReferrerBonus)?;
        if let Some(extra) = threshold_bonus {
            self.dispatcher.grant(referrer_id, extra, GrantReason::ThresholdBonus)?;
        }

        // Terminal one-time transition; cannot race while the guard is
        // held, but the write is conditional regardless.
        let claimed =
            self.accounts.try_mark_redeemed(id, display_name, &code).context(StoreSnafu)?;
        if !claimed {
            return Ok(RedeemOutcome::AlreadyRedeemed);
        }

        info!(
            account = %id,
            referrer = %referrer_id,
            new_count,
            threshold_hit = threshold_bonus.is_some(),
            "redemption recorded"
        );

        Ok(RedeemOutcome::Success { referrer_name, referrer_bonus: bonus, threshold_bonus })
    }
}
