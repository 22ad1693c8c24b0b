//! Core types for the referral redemption ledger.
//!
//! This crate provides:
//! - Identifier and code newtypes with validation
//! - The persisted account row, grant audit record and typed outcomes
//! - The postcard codec used for every stored value
//! - Configuration loading and validation

pub mod codec;
pub mod config;
mod types;

pub use codec::{CodecError, decode, encode};
pub use config::{ConfigError, LedgerConfig, MAX_TOP_LIMIT, ReferralConfig};
pub use types::{
    AccountId, CODE_CHARSET, CODE_LEN, CodeParseError, CreditGrant, GrantReason, LeaderboardEntry,
    RedeemOutcome, ReferralAccount, ReferralCode,
};
