//! Core type definitions for the referral ledger.
//!
//! Covers:
//! - Identifier types (`AccountId`, `ReferralCode`)
//! - The persisted account row and grant audit record
//! - Typed redemption outcomes

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

// ============================================================================
// Identifier Types
// ============================================================================

/// Unique identifier for a member account.
///
/// Wraps the platform's 64-bit unsigned account identifier with
/// compile-time type safety so it cannot be mixed with counters or
/// amounts.
///
/// # Display
///
/// Formats with `acct:` prefix: `acct:76561198000000001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    /// Creates a new identifier from a raw value.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for AccountId {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<AccountId> for u64 {
    #[inline]
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

// ============================================================================
// Referral Codes
// ============================================================================

/// Number of characters in a referral code.
pub const CODE_LEN: usize = 8;

/// Alphabet a referral code is drawn from.
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Error parsing a referral code from user input.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CodeParseError {
    /// The input is not exactly [`CODE_LEN`] characters long.
    #[snafu(display("code must be {CODE_LEN} characters, got {len}"))]
    WrongLength {
        /// Length of the rejected input after trimming.
        len: usize,
    },

    /// The input contains a character outside `[A-Z0-9]`.
    #[snafu(display("code contains invalid character {ch:?}"))]
    InvalidChar {
        /// The offending character.
        ch: char,
    },
}

/// A validated 8-character referral code.
///
/// Codes are canonically uppercase; [`ReferralCode::parse`] trims and
/// uppercases its input so submitted codes are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Parses user input into a canonical code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeParseError`] if the trimmed input is not exactly
    /// [`CODE_LEN`] characters of `[A-Za-z0-9]`.
    pub fn parse(input: &str) -> Result<Self, CodeParseError> {
        let trimmed = input.trim();
        let len = trimmed.chars().count();
        if len != CODE_LEN {
            return Err(CodeParseError::WrongLength { len });
        }
        let canonical = trimmed.to_ascii_uppercase();
        if let Some(ch) = canonical.chars().find(|c| !c.is_ascii() || !CODE_CHARSET.contains(&(*c as u8))) {
            return Err(CodeParseError::InvalidChar { ch });
        }
        Ok(Self(canonical))
    }

    /// Builds a code from characters already drawn from [`CODE_CHARSET`].
    ///
    /// Generators are expected to uphold the charset invariant; this is
    /// checked in debug builds only.
    pub fn from_generated(chars: String) -> Self {
        debug_assert_eq!(chars.chars().count(), CODE_LEN);
        debug_assert!(chars.bytes().all(|b| CODE_CHARSET.contains(&b)));
        Self(chars)
    }

    /// Returns the canonical code string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Account Row
// ============================================================================

/// Persisted per-account referral state.
///
/// One row per distinct member identity, keyed by [`AccountId`]. Rows are
/// created implicitly on first interaction and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralAccount {
    /// Stable member identifier.
    pub id: AccountId,
    /// Last-observed human-readable name; refreshed on every
    /// code-generation or redemption-initiating interaction.
    pub display_name: String,
    /// This account's own referral code; absent until first requested.
    pub own_code: Option<ReferralCode>,
    /// The code this account redeemed; transitions absent-to-present at
    /// most once. There is no un-redeem.
    pub redeemed_code: Option<ReferralCode>,
    /// Successful redemptions naming this account as referrer.
    /// Monotonically non-decreasing.
    pub usage_count: u64,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ReferralAccount {
    /// Creates a fresh row with no code, no redemption and a zero count.
    pub fn new(id: AccountId, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            own_code: None,
            redeemed_code: None,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this account has already redeemed a code.
    #[inline]
    pub fn has_redeemed(&self) -> bool {
        self.redeemed_code.is_some()
    }
}

// ============================================================================
// Redemption Outcomes
// ============================================================================

/// Result of a redemption attempt.
///
/// Validation outcomes are expected, user-facing results and are returned,
/// never raised as errors; only storage failures surface as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedeemOutcome {
    /// The caller has already redeemed a code; nothing was mutated.
    AlreadyRedeemed,
    /// The submitted code is owned by the caller; nothing was mutated.
    SelfReferral,
    /// No account owns the submitted code; nothing was mutated.
    InvalidCode,
    /// Redemption recorded and rewards dispatched.
    Success {
        /// The referrer's display name as read before the increment.
        referrer_name: String,
        /// Flat bonus granted to both parties.
        referrer_bonus: i64,
        /// Threshold bonus additionally granted to the referrer, when the
        /// new usage count hit a configured milestone.
        threshold_bonus: Option<i64>,
    },
}

// ============================================================================
// Credit Grants
// ============================================================================

/// Why a credit delta was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    /// Flat bonus to the redeeming account.
    RefereeBonus,
    /// Flat bonus to the code owner.
    ReferrerBonus,
    /// Milestone bonus to the code owner.
    ThresholdBonus,
}

/// Audit record for one applied credit delta.
///
/// Flat and threshold bonuses are always separate records, preserving the
/// two-step amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditGrant {
    /// Account the credits were granted to.
    pub account: AccountId,
    /// Amount of the delta.
    pub amount: i64,
    /// Why the delta was applied.
    pub reason: GrantReason,
    /// When the delta was applied.
    pub granted_at: DateTime<Utc>,
}

// ============================================================================
// Leaderboard
// ============================================================================

/// One row of the top-N referrer query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Referrer display name.
    pub display_name: String,
    /// Successful redemptions of this referrer's code.
    pub usage_count: u64,
}
