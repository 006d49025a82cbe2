//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique key already taken
    #[error("record already exists")]
    Duplicate,

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;
