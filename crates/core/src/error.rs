use thiserror::Error;

use crate::Table;

/// Errors raised while building the migration plan or coercing source values.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("table plan has a dependency cycle involving {0}")]
    DependencyCycle(Table),

    #[error("{table} depends on {dependency}, which is not in the plan")]
    UnknownDependency { table: Table, dependency: Table },

    #[error("{table} listed more than once in the plan")]
    DuplicateTable { table: Table },

    #[error("{table} row {id}: invalid JSON payload: {source}")]
    InvalidPayload {
        table: Table,
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
