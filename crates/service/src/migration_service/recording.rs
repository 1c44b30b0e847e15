//! In-memory destination that enforces the constraints of the real schema.

#![allow(clippy::unwrap_used, reason = "test code")]

use std::collections::BTreeMap;
use std::sync::Mutex;

use aedelore_migrate_core::{Record, RowOutcome, Table, TableReport};
use aedelore_migrate_storage::{Destination, StorageError};
use async_trait::async_trait;

#[derive(Default)]
pub(super) struct RecordingDestination {
    rows: Mutex<BTreeMap<Table, BTreeMap<i64, Record>>>,
    sequences: Mutex<BTreeMap<Table, i64>>,
    writes: Mutex<Vec<Table>>,
    probes: Mutex<u32>,
}

impl RecordingDestination {
    pub(super) fn rows(&self, table: Table) -> BTreeMap<i64, Record> {
        self.rows.lock().unwrap().get(&table).cloned().unwrap_or_default()
    }

    pub(super) fn sequence(&self, table: Table) -> Option<i64> {
        self.sequences.lock().unwrap().get(&table).copied()
    }

    pub(super) fn writes(&self) -> Vec<Table> {
        self.writes.lock().unwrap().clone()
    }

    pub(super) fn probes(&self) -> u32 {
        *self.probes.lock().unwrap()
    }

    fn outcome(all: &BTreeMap<Table, BTreeMap<i64, Record>>, record: &Record) -> RowOutcome {
        let has = |table: Table, id: i64| all.get(&table).is_some_and(|rows| rows.contains_key(&id));
        if has(record.table(), record.id()) {
            return RowOutcome::Skipped;
        }
        let valid = match record {
            Record::User(u) => {
                let taken = all.get(&Table::Users).is_some_and(|rows| {
                    rows.values().any(|r| matches!(r, Record::User(o) if o.username == u.username))
                });
                if taken {
                    return RowOutcome::Conflict;
                }
                true
            },
            Record::Character(c) => has(Table::Users, c.user_id) && c.data.is_some(),
            Record::Campaign(c) => has(Table::Users, c.user_id),
            Record::Session(s) => {
                has(Table::Campaigns, s.campaign_id) && has(Table::Users, s.user_id) && s.data.is_some()
            },
        };
        if valid { RowOutcome::Inserted } else { RowOutcome::Failed }
    }
}

#[async_trait]
impl Destination for RecordingDestination {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn probe(&self) -> Result<bool, StorageError> {
        *self.probes.lock().unwrap() += 1;
        Ok(true)
    }

    async fn write_table(
        &self,
        table: Table,
        records: &[Record],
    ) -> Result<TableReport, StorageError> {
        self.writes.lock().unwrap().push(table);
        let mut report = TableReport::new(table);
        let mut all = self.rows.lock().unwrap();
        for record in records {
            let outcome = Self::outcome(&all, record);
            if outcome == RowOutcome::Inserted {
                all.entry(table).or_default().insert(record.id(), record.clone());
            }
            report.record(record.id(), outcome);
        }
        if let Some(max_id) = report.max_id {
            let present = all.get(&table).and_then(|rows| rows.keys().max().copied()).unwrap_or(0);
            self.sequences.lock().unwrap().insert(table, max_id.max(present));
            report.sequence_adjusted = true;
        }
        Ok(report)
    }
}
