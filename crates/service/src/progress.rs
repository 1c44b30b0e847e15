use std::time::Duration;

use aedelore_migrate_core::{Table, TableReport};

/// Events emitted while a migration runs, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    WaitingForDestination { backend: &'static str },
    DestinationReady { attempt: u32 },
    DestinationUnavailable { attempts: u32, waited: Duration },
    TableStarted { table: Table },
    TableFinished { report: TableReport },
    Completed,
}
