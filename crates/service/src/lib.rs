//! Service layer for aedelore-migrate
//!
//! Waits for the destination, then copies the source tables into it in
//! dependency order, reporting progress to the caller.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]

mod error;
mod migration_service;
mod progress;
mod readiness;

pub use error::{Result, ServiceError};
pub use migration_service::{dry_run, MigrationOutcome, MigrationService, PlannedTable};
pub use progress::Progress;
pub use readiness::wait_until_ready;
