//! Referral redemption engine.
//!
//! This crate provides:
//! - The code registry (lazy, stable, collision-checked referral codes)
//! - The redemption engine with its one-time claim protocol
//! - Credit dispatch through live sessions with persisted fallback
//! - The session registry and per-account lock map
//! - Read-only leaderboard and invite-count queries
//!
//! Adapters consume everything through [`ReferralLedger`].

mod codegen;
mod credit;
mod error;
mod leaderboard;
mod ledger;
mod locks;
mod redeem;
mod registry;
mod session;

pub use codegen::CodeGenerator;
pub use credit::{CreditDispatcher, CreditSink};
pub use error::{EngineError, Result};
pub use leaderboard::LeaderboardReader;
pub use ledger::{DB_FILE, ReferralLedger};
pub use locks::{AccountGuard, AccountLocks};
pub use redeem::RedemptionEngine;
pub use registry::{CodeRegistry, MAX_CODE_ATTEMPTS};
pub use session::{LiveHandle, SessionError, SessionRegistry};
