use thiserror::Error;

use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<DatabaseError> for RepositoryError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Sqlite(e) => RepositoryError::Sqlite(e),
            DatabaseError::Pool(e) => RepositoryError::Pool(e),
            other => RepositoryError::Database(other.to_string()),
        }
    }
}
