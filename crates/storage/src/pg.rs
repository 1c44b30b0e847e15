//! PostgreSQL destination using a sqlx pool.
//!
//! Each table is written in one transaction with a savepoint per row, so a
//! failing row is rolled back on its own and the rest of the table commits.

use std::time::Duration;

use aedelore_migrate_core::constants::{
    PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS,
};
use aedelore_migrate_core::{
    sequence_fix_template, Column, ColumnKind, Record, RowOutcome, SqlValue, Table, TableReport,
};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StorageError;
use crate::traits::Destination;

#[derive(Clone, Debug)]
pub struct PgDestination {
    pool: PgPool,
}

impl PgDestination {
    /// Build the pool without connecting; readiness is checked with
    /// [`Destination::probe`].
    pub fn connect_lazy(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Prepared statements are cached by SQL text, so a column must bind the
/// same type whether or not its value is `NULL`.
fn bind_null(
    query: Query<'_, Postgres, PgArguments>,
    kind: ColumnKind,
) -> Query<'_, Postgres, PgArguments> {
    match kind {
        ColumnKind::Key | ColumnKind::Integer => query.bind(None::<i64>),
        ColumnKind::Text | ColumnKind::Timestamp => query.bind(None::<String>),
        ColumnKind::Json => query.bind(None::<sqlx::types::Json<sqlx::types::JsonValue>>),
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    column: &'q Column,
) -> Query<'q, Postgres, PgArguments> {
    match &column.value {
        SqlValue::Null => bind_null(query, column.kind),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Json(doc) => query.bind(sqlx::types::Json(doc)),
    }
}

async fn insert_row(
    tx: &mut Transaction<'static, Postgres>,
    record: &Record,
) -> Result<RowOutcome, StorageError> {
    let statement = record.to_insert();
    let (sql, columns) = statement.parameterized();
    let query = columns.into_iter().fold(sqlx::query(&sql), bind_value);

    let mut savepoint = sqlx::Acquire::begin(&mut *tx).await?;
    match query.execute(&mut *savepoint).await {
        Ok(result) => {
            savepoint.commit().await?;
            Ok(if result.rows_affected() == 0 { RowOutcome::Skipped } else { RowOutcome::Inserted })
        },
        Err(err) => {
            savepoint.rollback().await?;
            match StorageError::from(err) {
                StorageError::Duplicate(message) => {
                    tracing::warn!(table = %record.table(), id = record.id(), %message, "unique constraint rejected row");
                    Ok(RowOutcome::Conflict)
                },
                StorageError::Database(sqlx::Error::Database(db_err)) => {
                    tracing::warn!(
                        table = %record.table(),
                        id = record.id(),
                        code = ?db_err.code(),
                        error = %db_err,
                        "SQL error"
                    );
                    Ok(RowOutcome::Failed)
                },
                other => Err(other),
            }
        },
    }
}

async fn fix_sequence(
    tx: &mut Transaction<'static, Postgres>,
    table: Table,
    max_id: i64,
) -> Result<(), StorageError> {
    let sql = sequence_fix_template(table);
    let mut savepoint = sqlx::Acquire::begin(&mut *tx).await?;
    match sqlx::query(&sql).bind(max_id).execute(&mut *savepoint).await {
        Ok(_) => {
            savepoint.commit().await?;
            Ok(())
        },
        Err(err) => {
            savepoint.rollback().await?;
            Err(err.into())
        },
    }
}

#[async_trait]
impl Destination for PgDestination {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn probe(&self) -> Result<bool, StorageError> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => Ok(true),
            Err(err) => {
                tracing::debug!(error = %err, "PostgreSQL not ready");
                Ok(false)
            },
        }
    }

    async fn write_table(
        &self,
        table: Table,
        records: &[Record],
    ) -> Result<TableReport, StorageError> {
        let mut report = TableReport::new(table);
        let mut tx = self.pool.begin().await?;

        for record in records {
            let outcome = insert_row(&mut tx, record).await?;
            report.record(record.id(), outcome);
        }

        if let Some(max_id) = report.max_id {
            match fix_sequence(&mut tx, table, max_id).await {
                Ok(()) => report.sequence_adjusted = true,
                Err(err) => {
                    tracing::warn!(table = %table, max_id, error = %err, "failed to adjust sequence");
                },
            }
        }

        tx.commit().await?;
        Ok(report)
    }
}
