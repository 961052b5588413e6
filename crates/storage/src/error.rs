//! Typed error enum for the storage layer.
//!
//! Callers match on [`StorageError::is_transient`] to decide between
//! retrying a write and degrading to per-row writes.

use thiserror::Error;

/// SQLSTATE codes worth retrying: statement timeout, serialization failure,
/// deadlock, too many connections.
const TRANSIENT_SQLSTATES: [&str; 4] = ["57014", "40001", "40P01", "53300"];

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQL / connection / timeout failure.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Store could not be reached or is temporarily refusing work.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Store refused the payload itself; retrying the same rows cannot help.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => true,
            Self::Database(sqlx::Error::Database(db_err)) => db_err.code().is_some_and(|code| {
                code.starts_with("08") || TRANSIENT_SQLSTATES.iter().any(|s| code == *s)
            }),
            _ => false,
        }
    }
}

/// Custom `From<sqlx::Error>`: data errors (SQLSTATE class 22, e.g. a NUL
/// byte in text) become `Rejected`, everything else stays `Database`.
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().is_some_and(|c| c.starts_with("22")) => {
                Self::Rejected(db_err.message().to_owned())
            },
            _ => Self::Database(err),
        }
    }
}
