//! Error types for engine operations.
//!
//! Validation outcomes of a redemption are not errors; they are variants
//! of [`RedeemOutcome`](referral_ledger_types::RedeemOutcome). Errors
//! here are storage failures and exhausted code generation.

use referral_ledger_storage::StoreError;
use snafu::Snafu;

/// Errors from ledger engine operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EngineError {
    /// Underlying storage operation failed.
    #[snafu(display("storage error: {source}"))]
    Store {
        /// The underlying storage error.
        #[snafu(source(from(StoreError, Box::new)))]
        source: Box<StoreError>,
    },

    /// The data directory could not be prepared.
    #[snafu(display("failed to prepare data dir {path}: {source}"))]
    DataDir {
        /// The directory that could not be created.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Code generation kept colliding with existing codes.
    #[snafu(display("gave up generating a unique code after {attempts} attempts"))]
    CodeSpaceExhausted {
        /// Number of candidates tried.
        attempts: usize,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
