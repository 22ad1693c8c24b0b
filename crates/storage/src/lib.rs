//! Storage engine for the referral ledger.
//!
//! This crate provides:
//! - redb-based persistent storage with fixed, compile-time tables
//! - The account store with its set-if-absent and conditional-update
//!   operations
//! - The persisted balance store (additive updates only)
//! - The append-only grant audit log

mod accounts;
mod balances;
mod engine;
mod error;
mod grants;
mod tables;

pub use accounts::{AccountStore, CodeAssignment};
pub use balances::BalanceStore;
pub use engine::{InMemoryStorageEngine, StorageEngine};
pub use error::{Result, StoreError};
pub use grants::GrantLog;
pub use tables::Tables;
