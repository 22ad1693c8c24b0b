//! Configuration for the referral ledger.
//!
//! Configuration is loaded from TOML files and environment variables.
//! All structs validate their values after deserialization via
//! [`validate`](ReferralConfig::validate), and programmatic construction
//! goes through fallible builders.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Configuration error.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// Reading configuration sources failed.
    #[snafu(display("failed to load config: {source}"))]
    Load {
        /// The underlying config error.
        source: config::ConfigError,
    },

    /// Deserializing the merged configuration failed.
    #[snafu(display("failed to parse config: {source}"))]
    Parse {
        /// The underlying config error.
        source: config::ConfigError,
    },

    /// A configuration value is outside its valid range.
    #[snafu(display("invalid config: {message}"))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Hard cap on the leaderboard query limit.
///
/// The configured limit is operator-controlled, not attacker-controlled,
/// but it still bounds the scan.
pub const MAX_TOP_LIMIT: usize = 100;

/// Top-level configuration for a ledger instance.
#[derive(Debug, Clone, bon::Builder, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Directory holding the persistent database file.
    #[builder(into)]
    pub data_dir: PathBuf,
    /// Referral reward knobs.
    #[serde(default)]
    #[builder(default)]
    pub referral: ReferralConfig,
}

impl LedgerConfig {
    /// Load configuration from a file and the environment.
    ///
    /// Supports TOML format. Environment variables override file values
    /// using the `REFERRAL__` prefix with `__` as the nesting separator
    /// (e.g. `REFERRAL__REFERRAL__TOP_LIMIT=25`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be read,
    /// [`ConfigError::Parse`] if the merged configuration does not
    /// deserialize, and [`ConfigError::Validation`] if a value is out of
    /// range.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let builder = config::Config::builder();

        let builder = if let Some(path) = path {
            builder.add_source(config::File::with_name(path))
        } else {
            builder.add_source(config::File::with_name("referral-ledger").required(false))
        };

        let builder = builder.add_source(
            config::Environment::with_prefix("REFERRAL").separator("__").try_parsing(true),
        );

        let merged = builder.build().map_err(|source| ConfigError::Load { source })?;
        let config: Self =
            merged.try_deserialize().map_err(|source| ConfigError::Parse { source })?;
        config.referral.validate()?;
        Ok(config)
    }

    /// Create a configuration for testing.
    #[allow(clippy::disallowed_methods)]
    pub fn for_test(data_dir: PathBuf) -> Self {
        Self { data_dir, referral: ReferralConfig::default() }
    }
}

/// Referral reward configuration.
///
/// # Validation Rules
///
/// - `referral_bonus` must be >= 0
/// - threshold keys must be >= 1 and bonus values >= 0
/// - `top_limit` must be in `1..=`[`MAX_TOP_LIMIT`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralConfig {
    /// Flat bonus granted to referee and referrer on every successful
    /// redemption.
    #[serde(default = "default_referral_bonus")]
    pub referral_bonus: i64,
    /// Usage-count milestones mapped to one-time referrer bonuses.
    #[serde(default = "default_bonus_thresholds", with = "threshold_map")]
    pub bonus_thresholds: BTreeMap<u64, i64>,
    /// Number of rows returned by the leaderboard query.
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,
}

#[bon::bon]
impl ReferralConfig {
    /// Creates a new referral configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if:
    /// - `referral_bonus` < 0
    /// - a threshold key is 0 or a threshold bonus is negative
    /// - `top_limit` is 0 or greater than [`MAX_TOP_LIMIT`]
    #[builder]
    pub fn new(
        #[builder(default = default_referral_bonus())] referral_bonus: i64,
        #[builder(default = default_bonus_thresholds())] bonus_thresholds: BTreeMap<u64, i64>,
        #[builder(default = default_top_limit())] top_limit: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self { referral_bonus, bonus_thresholds, top_limit };
        config.validate()?;
        Ok(config)
    }

    /// Validates all values against the documented rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.referral_bonus < 0 {
            return Err(ConfigError::Validation {
                message: format!("referral_bonus must be >= 0, got {}", self.referral_bonus),
            });
        }
        for (count, bonus) in &self.bonus_thresholds {
            if *count == 0 {
                return Err(ConfigError::Validation {
                    message: "bonus threshold key must be >= 1".to_string(),
                });
            }
            if *bonus < 0 {
                return Err(ConfigError::Validation {
                    message: format!("bonus for threshold {count} must be >= 0, got {bonus}"),
                });
            }
        }
        if self.top_limit == 0 || self.top_limit > MAX_TOP_LIMIT {
            return Err(ConfigError::Validation {
                message: format!("top_limit must be in 1..={MAX_TOP_LIMIT}, got {}", self.top_limit),
            });
        }
        Ok(())
    }

    /// Returns the one-time bonus due when the usage count first reaches
    /// `count`, if that count is a configured milestone.
    #[inline]
    pub fn threshold_bonus(&self, count: u64) -> Option<i64> {
        self.bonus_thresholds.get(&count).copied()
    }
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            referral_bonus: default_referral_bonus(),
            bonus_thresholds: default_bonus_thresholds(),
            top_limit: default_top_limit(),
        }
    }
}

fn default_referral_bonus() -> i64 {
    100
}

fn default_bonus_thresholds() -> BTreeMap<u64, i64> {
    BTreeMap::from([(5, 1000), (10, 2000), (15, 3000)])
}

fn default_top_limit() -> usize {
    10
}

/// Serde adapter for the threshold table.
///
/// TOML (and environment) table keys are strings; this maps them to the
/// numeric usage counts the engine works with.
mod threshold_map {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<u64, i64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let as_strings: BTreeMap<String, i64> =
            map.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        as_strings.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u64, i64>, D::Error> {
        let as_strings = BTreeMap::<String, i64>::deserialize(deserializer)?;
        as_strings
            .into_iter()
            .map(|(k, v)| {
                k.parse::<u64>()
                    .map(|count| (count, v))
                    .map_err(|_| D::Error::custom(format!("invalid threshold key {k:?}")))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReferralConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.referral_bonus, 100);
        assert_eq!(config.threshold_bonus(5), Some(1000));
        assert_eq!(config.threshold_bonus(6), None);
        assert_eq!(config.top_limit, 10);
    }

    #[test]
    fn test_builder_rejects_negative_bonus() {
        let result = ReferralConfig::builder().referral_bonus(-1).build();
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_builder_rejects_zero_threshold_key() {
        let result =
            ReferralConfig::builder().bonus_thresholds(BTreeMap::from([(0, 500)])).build();
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_builder_rejects_out_of_bounds_top_limit() {
        assert!(ReferralConfig::builder().top_limit(0).build().is_err());
        assert!(ReferralConfig::builder().top_limit(MAX_TOP_LIMIT + 1).build().is_err());
        assert!(ReferralConfig::builder().top_limit(MAX_TOP_LIMIT).build().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("ledger.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/var/lib/referral"

[referral]
referral_bonus = 250
top_limit = 5

[referral.bonus_thresholds]
3 = 750
"#,
        )
        .expect("write config file");

        let config = LedgerConfig::load(path.to_str()).expect("load config");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/referral"));
        assert_eq!(config.referral.referral_bonus, 250);
        assert_eq!(config.referral.top_limit, 5);
        assert_eq!(config.referral.threshold_bonus(3), Some(750));
        // Unset keys fall back to serde defaults, which supply none here
        // because the table was overridden wholesale.
        assert_eq!(config.referral.threshold_bonus(5), None);
    }

    #[test]
    fn test_for_test_uses_defaults() {
        let config = LedgerConfig::for_test(PathBuf::from("/tmp/x"));
        config.referral.validate().expect("test config must validate");
    }
}
