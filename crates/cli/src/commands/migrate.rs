//! SQLite → PostgreSQL migration command.
//!
//! Idempotent: rows whose id already exists in PostgreSQL are skipped, so the
//! command can be re-run after a partial failure.

use std::path::Path;
use std::sync::Arc;

use aedelore_migrate_core::MIGRATION_PLAN;
use aedelore_migrate_service::{dry_run, MigrationOutcome, MigrationService, Progress};
use aedelore_migrate_storage::{ContainerConfig, ContainerDestination, Destination, PgDestination};

use crate::{Backend, Cli};

pub(crate) async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.dry_run {
        return plan(&cli.source).await;
    }

    // Kept concrete so the pool can be closed once the run is over.
    let mut pool = None;
    let destination: Arc<dyn Destination> = match cli.backend {
        Backend::Postgres => {
            let pg = Arc::new(PgDestination::connect_lazy(&cli.database_url)?);
            pool = Some(Arc::clone(&pg));
            pg
        },
        Backend::Container => Arc::new(ContainerDestination::new(ContainerConfig {
            docker_bin: cli.docker_bin,
            container: cli.container,
            user: cli.db_user,
            database: cli.db_name,
        })),
    };
    tracing::debug!(backend = destination.name(), source = %cli.source.display(), "starting migration");

    let result = MigrationService::new(destination).run(&cli.source, print_progress).await;
    if let Some(pg) = pool {
        pg.close().await;
    }
    let outcome = result?;
    match outcome {
        MigrationOutcome::SourceMissing { path } => {
            println!("SQLite database not found at {}", path.display());
        },
        MigrationOutcome::Completed { reports } => {
            let dropped: usize = reports.iter().map(|r| r.dropped()).sum();
            if dropped > 0 {
                println!("{dropped} rows were not migrated; see the warnings above");
            }
        },
        // Already reported through progress.
        MigrationOutcome::DestinationUnavailable { .. } | MigrationOutcome::Planned { .. } => {},
    }
    Ok(())
}

fn print_progress(progress: Progress) {
    match progress {
        Progress::WaitingForDestination { .. } => println!("Waiting for PostgreSQL..."),
        Progress::DestinationReady { .. } => println!("PostgreSQL is ready!"),
        Progress::DestinationUnavailable { attempts, waited } => {
            println!("PostgreSQL not ready after {attempts} attempts ({}s)", waited.as_secs());
        },
        Progress::TableStarted { table } => println!("\nMigrating {table}..."),
        Progress::TableFinished { report } => println!("  {report}"),
        Progress::Completed => println!("\nMigration complete!"),
    }
}

async fn plan(source: &Path) -> anyhow::Result<()> {
    match dry_run(source, MIGRATION_PLAN).await? {
        MigrationOutcome::SourceMissing { path } => {
            println!("SQLite database not found at {}", path.display());
        },
        MigrationOutcome::Planned { tables } => {
            println!("Dry run, nothing will be written:");
            for t in tables {
                println!("  {}: {} rows ({} rejected)", t.table, t.rows, t.rejected);
            }
        },
        MigrationOutcome::DestinationUnavailable { .. } | MigrationOutcome::Completed { .. } => {},
    }
    Ok(())
}
