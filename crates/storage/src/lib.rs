//! Storage layer for aedelore-migrate
//!
//! Read-only SQLite source plus the two PostgreSQL destinations: a sqlx
//! pool and `psql` run inside the database container.

mod container;
mod error;
mod pg;
mod psql;
mod sqlite;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
mod traits;

pub use container::{
    CommandOutput, CommandRunner, ContainerConfig, ContainerDestination, ProcessRunner,
    StatementOutcome,
};
pub use error::{
    StorageError, SQLSTATE_DUPLICATE_OBJECT, SQLSTATE_DUPLICATE_TABLE, SQLSTATE_UNIQUE_VIOLATION,
};
pub use pg::PgDestination;
pub use sqlite::{RejectedRow, SourceRows, SqliteSource};
pub use traits::Destination;
