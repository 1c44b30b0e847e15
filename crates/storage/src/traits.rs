//! Destination backend abstraction.
//!
//! The migration service only talks to a [`Destination`]; the PostgreSQL pool
//! and the `docker exec psql` shell-out both implement it.

use aedelore_migrate_core::{Record, Table, TableReport};
use async_trait::async_trait;

use crate::error::StorageError;

/// Where migrated rows are written.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// One readiness probe. `Ok(false)` means "not yet", not a failure.
    async fn probe(&self) -> Result<bool, StorageError>;

    /// Insert `records` (all from `table`) with `ON CONFLICT (id) DO NOTHING`,
    /// then move the table's sequence up to the highest id written.
    ///
    /// Row-level failures are counted in the report, not returned. An `Err`
    /// means the table as a whole could not be processed.
    async fn write_table(
        &self,
        table: Table,
        records: &[Record],
    ) -> Result<TableReport, StorageError>;
}
