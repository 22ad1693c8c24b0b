//! Table definitions for redb storage.
//!
//! All tables are fixed and known at compile time. Account rows and
//! grant records are postcard-encoded; index and counter tables use
//! primitive key/value types directly.

use redb::TableDefinition;

/// Table definitions for referral ledger storage.
pub struct Tables;

impl Tables {
    // =========================================================================
    // Account Tables
    // =========================================================================

    /// Account rows: account id → serialized `ReferralAccount`.
    pub const ACCOUNTS: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("accounts");

    /// Code index: canonical code string → owning account id.
    ///
    /// Maintained in the same write transaction as the owning account
    /// row; an occupied entry is what makes a generated code a
    /// collision, so uniqueness holds by construction.
    pub const CODES: TableDefinition<'static, &'static str, u64> = TableDefinition::new("codes");

    // =========================================================================
    // Credit Tables
    // =========================================================================

    /// Persisted balances: account id → credits.
    ///
    /// The offline half of the wallet capability; only additive updates
    /// are applied here.
    pub const BALANCES: TableDefinition<'static, u64, i64> = TableDefinition::new("balances");

    /// Grant audit log: sequence → serialized `CreditGrant`.
    pub const GRANTS: TableDefinition<'static, u64, &'static [u8]> = TableDefinition::new("grants");

    /// Sequence counters: name → next value.
    /// Keys: "seq:grant".
    pub const SEQUENCES: TableDefinition<'static, &'static str, u64> =
        TableDefinition::new("sequences");
}

/// Sequence counter key for the grant audit log.
pub(crate) const GRANT_SEQ_KEY: &str = "seq:grant";
