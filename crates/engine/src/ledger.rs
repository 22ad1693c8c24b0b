//! The `ReferralLedger` facade.
//!
//! Wires configuration, storage, the session registry, the lock map and
//! the code generator into one handle exposing the adapter surface:
//! code generation, redemption, the invite-count query and the
//! leaderboard.

use std::sync::Arc;

use redb::Database;
use snafu::ResultExt;

use referral_ledger_storage::{
    AccountStore, BalanceStore, GrantLog, InMemoryStorageEngine, StorageEngine,
};
use referral_ledger_types::{
    AccountId, CreditGrant, LeaderboardEntry, LedgerConfig, RedeemOutcome, ReferralCode,
    ReferralConfig,
};

use crate::codegen::CodeGenerator;
use crate::credit::CreditDispatcher;
use crate::error::{DataDirSnafu, Result, StoreSnafu};
use crate::leaderboard::LeaderboardReader;
use crate::locks::AccountLocks;
use crate::redeem::RedemptionEngine;
use crate::registry::CodeRegistry;
use crate::session::SessionRegistry;

/// Database file name inside the configured data directory.
pub const DB_FILE: &str = "referral.redb";

/// One handle over the whole referral subsystem.
///
/// Adapters resolve a caller identity (account id + display name) and
/// call into this facade; every method is synchronous and safe to call
/// from concurrent adapter threads.
pub struct ReferralLedger {
    registry: CodeRegistry,
    engine: RedemptionEngine,
    leaderboard: LeaderboardReader,
    sessions: Arc<SessionRegistry>,
    balances: BalanceStore,
    grants: GrantLog,
    config: ReferralConfig,
}

impl ReferralLedger {
    /// Opens (or creates) the persistent ledger described by the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DataDir`](crate::EngineError::DataDir) if
    /// the data directory cannot be created, or a storage error from
    /// opening the database.
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .context(DataDirSnafu { path: config.data_dir.display().to_string() })?;
        let engine = StorageEngine::open(config.data_dir.join(DB_FILE)).context(StoreSnafu)?;
        Ok(Self::with_database(
            engine.db(),
            config.referral.clone(),
            CodeGenerator::from_entropy(),
        ))
    }

    /// Opens an in-memory ledger, for tests and ephemeral use.
    pub fn in_memory(config: ReferralConfig, codegen: CodeGenerator) -> Result<Self> {
        let engine = InMemoryStorageEngine::open().context(StoreSnafu)?;
        Ok(Self::with_database(engine.db(), config, codegen))
    }

    /// Wires the component graph over an already-open database.
    pub fn with_database(
        db: Arc<Database>,
        config: ReferralConfig,
        codegen: CodeGenerator,
    ) -> Self {
        let accounts = AccountStore::new(Arc::clone(&db));
        let locks = Arc::new(AccountLocks::new());
        let sessions = Arc::new(SessionRegistry::new());
        let dispatcher = CreditDispatcher::new(Arc::clone(&db), Arc::clone(&sessions));

        let registry =
            CodeRegistry::new(accounts.clone(), Arc::clone(&locks), Arc::new(codegen));
        let engine =
            RedemptionEngine::new(accounts.clone(), dispatcher, locks, config.clone());
        let leaderboard = LeaderboardReader::new(accounts);
        let balances = BalanceStore::new(Arc::clone(&db));
        let grants = GrantLog::new(db);

        Self { registry, engine, leaderboard, sessions, balances, grants, config }
    }

    /// Returns the caller's referral code, generating one on first use.
    pub fn ensure_own_code(&self, id: AccountId, display_name: &str) -> Result<ReferralCode> {
        self.registry.ensure_own_code(id, display_name)
    }

    /// Returns the caller's referral code without generating one.
    pub fn own_code(&self, id: AccountId) -> Result<Option<ReferralCode>> {
        self.registry.own_code(id)
    }

    /// Attempts to redeem a submitted code for the caller.
    pub fn redeem(&self, id: AccountId, display_name: &str, code: &str) -> Result<RedeemOutcome> {
        self.engine.redeem(id, display_name, code)
    }

    /// The "check my invites" query.
    pub fn usage_count(&self, id: AccountId) -> Result<Option<u64>> {
        self.leaderboard.usage_count(id)
    }

    /// Top referrers using the configured display limit.
    pub fn top(&self) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboard.top(self.config.top_limit)
    }

    /// Top referrers with an explicit limit (still bounds-checked).
    pub fn top_with_limit(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboard.top(limit)
    }

    /// The live-session registry adapters attach handles to.
    pub fn sessions(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.sessions)
    }

    /// The account's persisted credit balance.
    pub fn balance(&self, id: AccountId) -> Result<i64> {
        self.balances.balance(id).context(StoreSnafu)
    }

    /// Audit records of every credit delta applied to an account.
    pub fn grant_history(&self, id: AccountId) -> Result<Vec<CreditGrant>> {
        self.grants.for_account(id).context(StoreSnafu)
    }

    /// The active referral configuration.
    pub fn config(&self) -> &ReferralConfig {
        &self.config
    }
}
