use std::path::{Path, PathBuf};
use std::sync::Arc;

use aedelore_migrate_core::env_config::ReadinessPolicy;
use aedelore_migrate_core::{migration_order, Table, TableReport, TableSpec, MIGRATION_PLAN};
use aedelore_migrate_storage::{Destination, SqliteSource};

use crate::error::Result;
use crate::progress::Progress;
use crate::readiness::wait_until_ready;

#[cfg(test)]
mod recording;
#[cfg(test)]
mod tests;

/// Rows one table would contribute, as counted by a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTable {
    pub table: Table,
    pub rows: usize,
    pub rejected: usize,
}

/// How a run ended. Only the last two variants mean the source was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    SourceMissing { path: PathBuf },
    DestinationUnavailable { attempts: u32 },
    Completed { reports: Vec<TableReport> },
    Planned { tables: Vec<PlannedTable> },
}

/// Copies the source tables into a [`Destination`] in dependency order.
pub struct MigrationService {
    destination: Arc<dyn Destination>,
    policy: ReadinessPolicy,
    plan: Vec<TableSpec>,
}

impl MigrationService {
    #[must_use]
    pub fn new(destination: Arc<dyn Destination>) -> Self {
        Self { destination, policy: ReadinessPolicy::from_env(), plan: MIGRATION_PLAN.to_vec() }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ReadinessPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_plan(mut self, plan: Vec<TableSpec>) -> Self {
        self.plan = plan;
        self
    }

    /// Run the whole migration.
    ///
    /// A missing source file or a destination that never becomes ready end
    /// the run early with the matching outcome; nothing is written. Errors
    /// are reserved for an invalid plan and table-level failures.
    pub async fn run(
        &self,
        source_path: &Path,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<MigrationOutcome> {
        let order = migration_order(&self.plan)?;

        if !source_path.exists() {
            tracing::warn!(path = %source_path.display(), "source database not found");
            return Ok(MigrationOutcome::SourceMissing { path: source_path.to_owned() });
        }

        if !wait_until_ready(self.destination.as_ref(), self.policy, &mut on_progress).await? {
            return Ok(MigrationOutcome::DestinationUnavailable { attempts: self.policy.attempts });
        }

        let source = SqliteSource::open(source_path)?;
        let mut reports = Vec::with_capacity(order.len());
        for table in order {
            on_progress(Progress::TableStarted { table });
            let rows = source.read_table(table).await?;
            let mut report = self.destination.write_table(table, &rows.records).await?;
            report.read = rows.len();
            report.rejected = rows.rejected.len();
            tracing::info!(
                table = %table,
                read = report.read,
                inserted = report.inserted,
                skipped = report.skipped,
                dropped = report.dropped(),
                "table migrated"
            );
            on_progress(Progress::TableFinished { report: report.clone() });
            reports.push(report);
        }
        source.close()?;

        on_progress(Progress::Completed);
        Ok(MigrationOutcome::Completed { reports })
    }
}

/// Read every table of the source in plan order and count what would be
/// migrated. Never touches a destination.
pub async fn dry_run(source_path: &Path, plan: &[TableSpec]) -> Result<MigrationOutcome> {
    let order = migration_order(plan)?;
    if !source_path.exists() {
        return Ok(MigrationOutcome::SourceMissing { path: source_path.to_owned() });
    }

    let source = SqliteSource::open(source_path)?;
    let mut tables = Vec::with_capacity(order.len());
    for table in order {
        let rows = source.read_table(table).await?;
        tables.push(PlannedTable { table, rows: rows.records.len(), rejected: rows.rejected.len() });
    }
    source.close()?;
    Ok(MigrationOutcome::Planned { tables })
}
