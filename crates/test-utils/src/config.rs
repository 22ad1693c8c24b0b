//! Canned configurations for tests.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use std::path::Path;

use referral_ledger_types::{LedgerConfig, ReferralConfig};

/// A ledger configuration with the default reward knobs, rooted at the
/// given data directory.
#[must_use]
pub fn ledger_config(data_dir: &Path) -> LedgerConfig {
    LedgerConfig::for_test(data_dir.to_path_buf())
}

/// A referral configuration with explicit knobs for scenario tests.
///
/// # Panics
///
/// Panics if the values do not validate; tests pass literals, so a panic
/// is a test bug.
#[must_use]
pub fn referral_config(bonus: i64, thresholds: &[(u64, i64)], top_limit: usize) -> ReferralConfig {
    ReferralConfig::builder()
        .referral_bonus(bonus)
        .bonus_thresholds(BTreeMap::from_iter(thresholds.iter().copied()))
        .top_limit(top_limit)
        .build()
        .expect("test referral config must validate")
}
