//! Shared fixtures for engine integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]

use std::sync::Arc;

use parking_lot::Mutex;

use referral_ledger_engine::{CodeGenerator, LiveHandle, ReferralLedger, SessionError};
use referral_ledger_test_utils::referral_config;
use referral_ledger_types::{AccountId, ReferralConfig};

/// Reward knobs used across scenarios: flat 100, thresholds at 5/10/15,
/// top-10 display.
pub fn default_config() -> ReferralConfig {
    referral_config(100, &[(5, 1000), (10, 2000), (15, 3000)], 10)
}

/// An in-memory ledger with the default config and a fixed seed.
pub fn ledger() -> ReferralLedger {
    ledger_with(default_config(), 42)
}

/// An in-memory ledger with explicit config and seed.
pub fn ledger_with(config: ReferralConfig, seed: u64) -> ReferralLedger {
    ReferralLedger::in_memory(config, CodeGenerator::seeded(seed)).expect("in-memory ledger")
}

/// A live handle that records every grant it receives.
pub struct RecordingHandle {
    id: AccountId,
    amounts: Mutex<Vec<i64>>,
}

impl RecordingHandle {
    pub fn new(id: AccountId) -> Arc<Self> {
        Arc::new(Self { id, amounts: Mutex::new(Vec::new()) })
    }

    /// Grants received so far, in delivery order.
    pub fn amounts(&self) -> Vec<i64> {
        self.amounts.lock().clone()
    }

    /// Sum of all grants received.
    pub fn total(&self) -> i64 {
        self.amounts.lock().iter().sum()
    }
}

impl LiveHandle for RecordingHandle {
    fn account_id(&self) -> AccountId {
        self.id
    }

    fn grant_credits(&self, amount: i64) -> Result<(), SessionError> {
        self.amounts.lock().push(amount);
        Ok(())
    }
}

/// A live handle whose session is already gone; every grant fails.
pub struct FailingHandle {
    id: AccountId,
}

impl FailingHandle {
    pub fn new(id: AccountId) -> Arc<Self> {
        Arc::new(Self { id })
    }
}

impl LiveHandle for FailingHandle {
    fn account_id(&self) -> AccountId {
        self.id
    }

    fn grant_credits(&self, _amount: i64) -> Result<(), SessionError> {
        Err(SessionError::GrantFailed { account: self.id, message: "session dropped".to_string() })
    }
}
