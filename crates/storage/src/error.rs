//! Error types for ledger storage operations.

use referral_ledger_types::CodecError;
use snafu::Snafu;

/// Storage layer error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    /// The database file could not be opened or created.
    #[snafu(display("failed to open database at {path}: {source}"))]
    Open {
        /// Path of the database file.
        path: String,
        /// The underlying redb error.
        source: redb::DatabaseError,
    },

    /// Beginning a transaction failed.
    #[snafu(display("transaction error: {source}"))]
    Transaction { source: redb::TransactionError },

    /// Opening a table inside a transaction failed.
    #[snafu(display("table error: {source}"))]
    Table { source: redb::TableError },

    /// A table read or write failed.
    #[snafu(display("storage error: {source}"))]
    Storage { source: redb::StorageError },

    /// Committing a write transaction failed.
    #[snafu(display("commit error: {source}"))]
    Commit { source: redb::CommitError },

    /// Encoding or decoding a stored value failed.
    #[snafu(display("codec error: {source}"))]
    Codec { source: CodecError },

    /// Stored state violates an invariant the store maintains.
    #[snafu(display("storage corruption: {message}"))]
    Corruption { message: String },
}

impl StoreError {
    /// Builds a corruption error for an invariant violation detected by
    /// a caller.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption { message: message.into() }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
