use std::fmt;

use crate::Table;

/// What happened to a single row on the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Inserted,
    /// Primary key already present; `ON CONFLICT (id) DO NOTHING` kept the old row.
    Skipped,
    /// Another unique constraint rejected the row.
    Conflict,
    Failed,
}

/// Per-table counts for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: Table,
    /// Rows read from the source, rejected ones included.
    pub read: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub failed: usize,
    /// Rows dropped before reaching the destination (unreadable or bad JSON).
    pub rejected: usize,
    pub max_id: Option<i64>,
    pub sequence_adjusted: bool,
}

impl TableReport {
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self {
            table,
            read: 0,
            inserted: 0,
            skipped: 0,
            conflicts: 0,
            failed: 0,
            rejected: 0,
            max_id: None,
            sequence_adjusted: false,
        }
    }

    pub fn record(&mut self, id: i64, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Conflict => self.conflicts += 1,
            RowOutcome::Failed => self.failed += 1,
        }
        self.max_id = Some(self.max_id.map_or(id, |m| m.max(id)));
    }

    /// Rows that reached the destination, whatever the outcome.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.inserted + self.skipped + self.conflicts + self.failed
    }

    /// Rows that did not end up in the destination for reasons other than
    /// already being there.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.conflicts + self.failed + self.rejected
    }
}

impl fmt::Display for TableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} inserted, {} skipped",
            self.table, self.inserted, self.skipped
        )?;
        if self.conflicts > 0 {
            write!(f, ", {} conflicts", self.conflicts)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.rejected > 0 {
            write!(f, ", {} rejected", self.rejected)?;
        }
        write!(f, " (total {})", self.read)
    }
}
