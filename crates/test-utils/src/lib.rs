//! Test utilities shared across the referral ledger workspace.
//!
//! Provides temporary-directory management and canned configurations.
//! Everything here panics on failure by design; these helpers only run
//! under test harnesses.

mod config;
mod test_dir;

pub use config::{ledger_config, referral_config};
pub use test_dir::TestDir;
