//! redb storage engine wrapper.
//!
//! Provides a thin wrapper around redb with:
//! - Database lifecycle management
//! - Table bootstrap at open time, so readers never observe a missing
//!   table
//! - Convenient constructors

use std::path::Path;
use std::sync::Arc;

use redb::Database;
use redb::backends::InMemoryBackend;
use snafu::ResultExt;

use crate::error::{CommitSnafu, OpenSnafu, Result, TableSnafu, TransactionSnafu};
use crate::tables::Tables;

/// Creates every fixed table inside one write transaction, so later
/// read transactions never observe a missing table.
fn create_tables(db: &Database) -> Result<()> {
    let txn = db.begin_write().context(TransactionSnafu)?;
    {
        txn.open_table(Tables::ACCOUNTS).context(TableSnafu)?;
        txn.open_table(Tables::CODES).context(TableSnafu)?;
        txn.open_table(Tables::BALANCES).context(TableSnafu)?;
        txn.open_table(Tables::GRANTS).context(TableSnafu)?;
        txn.open_table(Tables::SEQUENCES).context(TableSnafu)?;
    }
    txn.commit().context(CommitSnafu)
}

/// Storage engine backed by redb (file-based).
pub struct StorageEngine {
    db: Arc<Database>,
}

impl StorageEngine {
    /// Open or create a database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`](crate::StoreError::Open) if the file
    /// cannot be opened, and transaction/commit errors from the table
    /// bootstrap.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = if path.exists() { Database::open(path) } else { Database::create(path) }
            .context(OpenSnafu { path: path.display().to_string() })?;

        create_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Get a clone of the database handle.
    pub fn db(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }
}

impl Clone for StorageEngine {
    fn clone(&self) -> Self {
        Self { db: Arc::clone(&self.db) }
    }
}

/// In-memory storage engine for testing.
pub struct InMemoryStorageEngine {
    db: Arc<Database>,
}

impl InMemoryStorageEngine {
    /// Create a new in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`](crate::StoreError::Open) if the
    /// backend cannot be initialized.
    pub fn open() -> Result<Self> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .context(OpenSnafu { path: ":memory:".to_string() })?;

        create_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Get a clone of the database handle.
    pub fn db(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }
}

impl Clone for InMemoryStorageEngine {
    fn clone(&self) -> Self {
        Self { db: Arc::clone(&self.db) }
    }
}
