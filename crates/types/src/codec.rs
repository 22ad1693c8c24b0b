//! Centralized serialization and deserialization functions.
//!
//! All persisted values go through postcard with consistent error
//! handling via snafu; storage never touches postcard directly.

use serde::{Serialize, de::DeserializeOwned};
use snafu::Snafu;

/// Error type for codec operations.
#[derive(Debug, Snafu)]
pub enum CodecError {
    /// Encoding failed.
    #[snafu(display("Encoding failed: {source}"))]
    Encode {
        /// The underlying postcard error.
        source: postcard::Error,
    },

    /// Decoding failed.
    #[snafu(display("Decoding failed: {source}"))]
    Decode {
        /// The underlying postcard error.
        source: postcard::Error,
    },
}

/// Encodes a value to bytes using postcard serialization.
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).map_err(|source| CodecError::Encode { source })
}

/// Decodes bytes to a value using postcard deserialization.
///
/// # Errors
///
/// Returns `CodecError::Decode` if deserialization fails.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    postcard::from_bytes(bytes).map_err(|source| CodecError::Decode { source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::{AccountId, ReferralAccount, ReferralCode};

    #[test]
    fn test_account_row_round_trip() {
        let now = Utc::now();
        let mut account = ReferralAccount::new(AccountId::new(7), "alice", now);
        account.own_code = Some(ReferralCode::parse("AB12CD34").expect("valid code"));
        account.usage_count = 3;

        let bytes = encode(&account).expect("encode account");
        let decoded: ReferralAccount = decode(&bytes).expect("decode account");
        assert_eq!(account, decoded);
    }

    #[test]
    fn test_round_trip_with_absent_options() {
        let account = ReferralAccount::new(AccountId::new(1), "", Utc::now());
        let bytes = encode(&account).expect("encode");
        let decoded: ReferralAccount = decode(&bytes).expect("decode");
        assert!(decoded.own_code.is_none());
        assert!(decoded.redeemed_code.is_none());
    }

    #[test]
    fn test_decode_malformed_input() {
        let malformed = [0xFF, 0xFF, 0xFF, 0xFF];
        let result: Result<ReferralAccount, _> = decode(&malformed);
        let err = result.expect_err("malformed bytes must not decode");
        assert!(matches!(err, CodecError::Decode { .. }));
        assert!(err.to_string().contains("Decoding failed"));
    }

    #[test]
    fn test_decode_truncated_data() {
        let account = ReferralAccount::new(AccountId::new(9), "bob", Utc::now());
        let bytes = encode(&account).expect("encode");
        let result: Result<ReferralAccount, _> = decode(&bytes[..2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_empty_input() {
        let result: Result<u64, _> = decode(&[]);
        assert!(matches!(result, Err(CodecError::Decode { .. })));
    }
}
