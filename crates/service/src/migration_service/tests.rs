#![allow(clippy::unwrap_used, reason = "test code")]

use std::sync::Arc;
use std::time::Duration;

use aedelore_migrate_core::{Record, SqlValue, Table, TableReport, TableSpec};
use aedelore_migrate_storage::test_support::{create_source_db, insert_fixture_rows};
use aedelore_migrate_storage::{Destination, StorageError};
use async_trait::async_trait;
use serde_json::json;

use super::recording::RecordingDestination;
use super::*;
use crate::error::ServiceError;

const ORDER: [Table; 4] = [Table::Users, Table::Characters, Table::Campaigns, Table::Sessions];

fn fast_policy() -> ReadinessPolicy {
    ReadinessPolicy::new(3, Duration::from_millis(1))
}

fn service(dest: &Arc<RecordingDestination>) -> MigrationService {
    MigrationService::new(Arc::clone(dest) as Arc<dyn Destination>).with_policy(fast_policy())
}

fn reports(outcome: MigrationOutcome) -> Vec<TableReport> {
    match outcome {
        MigrationOutcome::Completed { reports } => reports,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

fn column(record: &Record, name: &str) -> SqlValue {
    record.to_insert().columns().iter().find(|c| c.name == name).unwrap().value.clone()
}

#[tokio::test]
async fn tables_are_written_in_dependency_order() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);
    let dest = Arc::new(RecordingDestination::default());

    let mut events = Vec::new();
    let outcome = service(&dest).run(&path, |p| events.push(p)).await.unwrap();

    assert_eq!(dest.writes(), ORDER);
    let finished = reports(outcome);
    assert_eq!(finished.iter().map(|r| r.table).collect::<Vec<_>>(), ORDER);
    assert!(finished.iter().all(|r| r.failed == 0 && r.conflicts == 0));

    assert_eq!(events[0], Progress::WaitingForDestination { backend: "recording" });
    assert_eq!(events[1], Progress::DestinationReady { attempt: 1 });
    assert_eq!(events[2], Progress::TableStarted { table: Table::Users });
    assert_eq!(events.last(), Some(&Progress::Completed));
}

#[tokio::test]
async fn primary_keys_are_preserved() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);
    let dest = Arc::new(RecordingDestination::default());
    service(&dest).run(&path, |_| {}).await.unwrap();

    assert_eq!(dest.rows(Table::Users).keys().copied().collect::<Vec<_>>(), vec![1, 3, 7]);
    assert_eq!(dest.rows(Table::Campaigns).keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(dest.rows(Table::Sessions).keys().copied().collect::<Vec<_>>(), vec![1, 4]);
    let sessions = dest.rows(Table::Sessions);
    let Record::Session(s) = &sessions[&4] else { panic!("expected a session") };
    assert_eq!((s.campaign_id, s.user_id), (2, 3));
}

#[tokio::test]
async fn second_run_inserts_nothing() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);
    let dest = Arc::new(RecordingDestination::default());
    let svc = service(&dest);

    let first = reports(svc.run(&path, |_| {}).await.unwrap());
    let second = reports(svc.run(&path, |_| {}).await.unwrap());

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(b.inserted, 0, "{}", b.table);
        assert_eq!(b.skipped, a.inserted, "{}", b.table);
    }
    assert_eq!(dest.rows(Table::Users).len(), 3);
    assert_eq!(dest.rows(Table::Characters).len(), 1);
}

#[tokio::test]
async fn missing_fields_get_defaults_on_insert() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);
    let dest = Arc::new(RecordingDestination::default());
    service(&dest).run(&path, |_| {}).await.unwrap();

    let sessions = dest.rows(Table::Sessions);
    assert_eq!(column(&sessions[&1], "status"), SqlValue::Text("active".to_owned()));
    assert_eq!(column(&sessions[&1], "date"), SqlValue::Text(String::new()));
    assert_eq!(column(&sessions[&1], "location"), SqlValue::Text(String::new()));
    assert_eq!(column(&sessions[&4], "status"), SqlValue::Text("locked".to_owned()));

    let campaigns = dest.rows(Table::Campaigns);
    assert_eq!(column(&campaigns[&1], "description"), SqlValue::Text(String::new()));
    assert_eq!(column(&campaigns[&2], "description"), SqlValue::Text("A sequel".to_owned()));
}

#[tokio::test]
async fn payloads_keep_their_structure_and_bad_ones_are_rejected() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);
    let dest = Arc::new(RecordingDestination::default());
    let finished = reports(service(&dest).run(&path, |_| {}).await.unwrap());

    let characters = finished.iter().find(|r| r.table == Table::Characters).unwrap();
    assert_eq!(characters.read, 2);
    assert_eq!(characters.inserted, 1);
    assert_eq!(characters.rejected, 1);

    let stored = dest.rows(Table::Characters);
    let Record::Character(c) = &stored[&1] else { panic!("expected a character") };
    assert_eq!(c.data, Some(json!({"hp": 10, "items": ["sword"]})));
}

#[tokio::test]
async fn sequences_end_at_highest_migrated_id() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);
    let dest = Arc::new(RecordingDestination::default());
    let finished = reports(service(&dest).run(&path, |_| {}).await.unwrap());

    assert_eq!(dest.sequence(Table::Users), Some(7));
    assert_eq!(dest.sequence(Table::Sessions), Some(4));
    assert!(finished.iter().all(|r| r.sequence_adjusted));
}

#[tokio::test]
async fn empty_table_leaves_sequence_alone() {
    let (_dir, path) = create_source_db();
    let dest = Arc::new(RecordingDestination::default());
    let finished = reports(service(&dest).run(&path, |_| {}).await.unwrap());

    assert!(finished.iter().all(|r| r.read == 0 && !r.sequence_adjusted));
    assert_eq!(dest.sequence(Table::Users), None);
}

#[tokio::test]
async fn missing_source_touches_nothing() {
    let (dir, _path) = create_source_db();
    let missing = dir.path().join("nope.db");
    let dest = Arc::new(RecordingDestination::default());

    let mut events = Vec::new();
    let outcome = service(&dest).run(&missing, |p| events.push(p)).await.unwrap();

    assert_eq!(outcome, MigrationOutcome::SourceMissing { path: missing.clone() });
    assert!(events.is_empty());
    assert_eq!(dest.probes(), 0);
    assert!(dest.writes().is_empty());
    assert!(!missing.exists());
}

struct NeverReady;

#[async_trait]
impl Destination for NeverReady {
    fn name(&self) -> &'static str {
        "never"
    }

    async fn probe(&self) -> std::result::Result<bool, StorageError> {
        Ok(false)
    }

    async fn write_table(
        &self,
        _table: Table,
        _records: &[Record],
    ) -> std::result::Result<TableReport, StorageError> {
        panic!("nothing may be written before the destination is ready")
    }
}

#[tokio::test]
async fn unavailable_destination_stops_before_reading() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);
    let svc = MigrationService::new(Arc::new(NeverReady)).with_policy(fast_policy());

    let outcome = svc.run(&path, |_| {}).await.unwrap();
    assert_eq!(outcome, MigrationOutcome::DestinationUnavailable { attempts: 3 });
}

#[tokio::test]
async fn cyclic_plan_is_rejected_up_front() {
    let (_dir, path) = create_source_db();
    let dest = Arc::new(RecordingDestination::default());
    let plan = vec![
        TableSpec { table: Table::Users, depends_on: &[Table::Sessions] },
        TableSpec { table: Table::Sessions, depends_on: &[Table::Users] },
    ];

    let err = service(&dest).with_plan(plan).run(&path, |_| {}).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(_)));
    assert_eq!(dest.probes(), 0);
}

#[tokio::test]
async fn unreadable_source_is_an_error() {
    let (dir, _path) = create_source_db();
    let bogus = dir.path().join("not-a-db");
    std::fs::write(&bogus, b"definitely not sqlite").unwrap();
    let dest = Arc::new(RecordingDestination::default());

    let err = service(&dest).run(&bogus, |_| {}).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(StorageError::Source(_))));
}

#[tokio::test]
async fn dry_run_counts_rows_without_a_destination() {
    let (_dir, path) = create_source_db();
    insert_fixture_rows(&path);

    let outcome = dry_run(&path, MIGRATION_PLAN).await.unwrap();
    let MigrationOutcome::Planned { tables } = outcome else { panic!("expected a plan") };
    assert_eq!(
        tables,
        vec![
            PlannedTable { table: Table::Users, rows: 3, rejected: 0 },
            PlannedTable { table: Table::Characters, rows: 1, rejected: 1 },
            PlannedTable { table: Table::Campaigns, rows: 2, rejected: 0 },
            PlannedTable { table: Table::Sessions, rows: 2, rejected: 0 },
        ]
    );
}

#[tokio::test]
async fn dry_run_reports_missing_source() {
    let (dir, _path) = create_source_db();
    let missing = dir.path().join("gone.db");
    let outcome = dry_run(&missing, MIGRATION_PLAN).await.unwrap();
    assert_eq!(outcome, MigrationOutcome::SourceMissing { path: missing });
}
