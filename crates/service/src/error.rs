//! Typed error enum for the service layer.

use aedelore_migrate_core::CoreError;
use aedelore_migrate_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying storage and configuration failures.
///
/// Preconditions (missing source, destination never ready) are not errors;
/// they come back as a [`crate::MigrationOutcome`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Reading the source or writing the destination failed for a whole table.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// The table plan is invalid.
    #[error("plan: {0}")]
    Core(#[from] CoreError),
}

/// Convenience alias for service-layer results.
pub type Result<T> = std::result::Result<T, ServiceError>;
