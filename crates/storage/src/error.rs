//! Typed error enum for the storage layer.
//!
//! Callers match on the failure mode (duplicate, already exists, statement
//! error) instead of inspecting message text.

use thiserror::Error;

/// SQLSTATE `unique_violation`.
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE `duplicate_table`.
pub const SQLSTATE_DUPLICATE_TABLE: &str = "42P07";
/// SQLSTATE `duplicate_object`.
pub const SQLSTATE_DUPLICATE_OBJECT: &str = "42710";

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading the SQLite source failed.
    #[error("source database error: {0}")]
    Source(#[source] rusqlite::Error),

    /// SQL / connection / timeout failure on the PostgreSQL pool.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Unique constraint violation.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Object the statement creates is already there.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A statement sent through `psql` failed.
    #[error("statement failed ({}): {message}", .code.as_deref().unwrap_or("no sqlstate"))]
    Statement { code: Option<String>, message: String },

    /// The container program could not be run at all.
    #[error("failed to run {program}: {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl StorageError {
    /// Map a SQLSTATE code and message onto the matching variant.
    pub fn from_sqlstate(code: Option<&str>, message: String) -> Self {
        match code {
            Some(SQLSTATE_UNIQUE_VIOLATION) => Self::Duplicate(message),
            Some(SQLSTATE_DUPLICATE_TABLE | SQLSTATE_DUPLICATE_OBJECT) => {
                Self::AlreadyExists(message)
            },
            _ => Self::Statement { code: code.map(str::to_owned), message },
        }
    }
}

/// Custom `From<sqlx::Error>`, not a blanket `#[from]`.
///
/// - SQLSTATE 23505 → `Duplicate`
/// - SQLSTATE 42P07 / 42710 → `AlreadyExists`
/// - Everything else → `Database`
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(SQLSTATE_UNIQUE_VIOLATION) => {
                    return Self::Duplicate(db_err.message().to_owned());
                },
                Some(SQLSTATE_DUPLICATE_TABLE | SQLSTATE_DUPLICATE_OBJECT) => {
                    return Self::AlreadyExists(db_err.message().to_owned());
                },
                _ => {},
            }
        }
        Self::Database(err)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Source(err)
    }
}
