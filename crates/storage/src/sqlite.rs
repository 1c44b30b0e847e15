//! Read-only access to the Aedelore SQLite database.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aedelore_migrate_core::{
    parse_payload, Campaign, Character, Record, Session, Table, User,
};
use chrono::DateTime;
use rusqlite::types::{FromSql, ValueRef};
use rusqlite::{Connection, OpenFlags, Row};
use serde_json::Value;

use crate::error::StorageError;

/// A source row that could not be turned into a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub id: Option<i64>,
    pub reason: String,
}

/// Everything read from one table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRows {
    pub table: Table,
    pub records: Vec<Record>,
    pub rejected: Vec<RejectedRow>,
}

impl SourceRows {
    /// Rows read, rejected ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct SqliteSource {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSource").field("path", &self.path).finish_non_exhaustive()
    }
}

fn lock_conn<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e: PoisonError<_>| StorageError::Blocking(format!("source lock poisoned: {e}")))
}

/// Run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Blocking(format!("spawn_blocking join error: {e}")))?
}

impl SqliteSource {
    /// Open the database read-only. Never creates the file.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(path = %path.display(), "opened source database");
        Ok(Self { conn: Arc::new(Mutex::new(conn)), path: path.to_owned() })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row of `table`, ordered by id.
    pub fn read_table_blocking(&self, table: Table) -> Result<SourceRows, StorageError> {
        let conn = lock_conn(&self.conn)?;
        let (sql, convert): (&str, fn(&RowReader<'_, '_>) -> Result<Record, RejectedRow>) =
            match table {
                Table::Users => (
                    "SELECT id, username, password_hash, created_at FROM users ORDER BY id",
                    read_user,
                ),
                Table::Characters => (
                    "SELECT id, user_id, name, data, updated_at FROM characters ORDER BY id",
                    read_character,
                ),
                Table::Campaigns => (
                    "SELECT id, user_id, name, description, created_at, updated_at
                     FROM campaigns ORDER BY id",
                    read_campaign,
                ),
                Table::Sessions => (
                    "SELECT id, campaign_id, user_id, session_number, date, location, status,
                            data, created_at, updated_at
                     FROM sessions ORDER BY id",
                    read_session,
                ),
            };

        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| Ok(RowReader::new(table, row).and_then(|r| convert(&r))))?;

        let mut out = SourceRows { table, records: Vec::new(), rejected: Vec::new() };
        for row in rows {
            match row? {
                Ok(record) => out.records.push(record),
                Err(rejected) => {
                    tracing::warn!(
                        table = %table,
                        id = ?rejected.id,
                        reason = %rejected.reason,
                        "rejecting unreadable source row"
                    );
                    out.rejected.push(rejected);
                },
            }
        }
        tracing::debug!(table = %table, rows = out.len(), "read source table");
        Ok(out)
    }

    /// Async wrapper running [`Self::read_table_blocking`] on the blocking pool.
    pub async fn read_table(&self, table: Table) -> Result<SourceRows, StorageError> {
        let source = self.clone();
        blocking(move || source.read_table_blocking(table)).await
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    ///
    /// Clones still held elsewhere keep the connection alive until dropped.
    pub fn close(self) -> Result<(), StorageError> {
        let Ok(mutex) = Arc::try_unwrap(self.conn) else {
            return Ok(());
        };
        let conn = mutex.into_inner().map_err(|e| {
            StorageError::Blocking(format!("source lock poisoned: {e}"))
        })?;
        conn.close().map_err(|(_, e)| StorageError::Source(e))
    }
}

/// Column access that turns every failure into a [`RejectedRow`] carrying
/// the row id once it is known.
struct RowReader<'r, 's> {
    table: Table,
    row: &'r Row<'s>,
    id: i64,
}

impl<'r, 's> RowReader<'r, 's> {
    fn new(table: Table, row: &'r Row<'s>) -> Result<Self, RejectedRow> {
        let id = row
            .get::<_, i64>(0)
            .map_err(|e| RejectedRow { id: None, reason: e.to_string() })?;
        Ok(Self { table, row, id })
    }

    fn reject(&self, reason: impl ToString) -> RejectedRow {
        RejectedRow { id: Some(self.id), reason: reason.to_string() }
    }

    fn get<T: FromSql>(&self, idx: usize) -> Result<T, RejectedRow> {
        self.row.get(idx).map_err(|e| self.reject(e))
    }

    /// Timestamps pass through as text. Integer and real values are read as
    /// Unix seconds and formatted the way SQLite's `CURRENT_TIMESTAMP` does.
    fn timestamp(&self, idx: usize) -> Result<Option<String>, RejectedRow> {
        let value = self.row.get_ref(idx).map_err(|e| self.reject(e))?;
        let secs = match value {
            ValueRef::Null => return Ok(None),
            ValueRef::Text(bytes) => {
                return std::str::from_utf8(bytes)
                    .map(|s| Some(s.to_owned()))
                    .map_err(|e| self.reject(format!("column {idx}: {e}")));
            },
            ValueRef::Integer(n) => n,
            // Sub-second part is dropped.
            ValueRef::Real(f) => f as i64,
            ValueRef::Blob(_) => {
                return Err(self.reject(format!("column {idx}: blob is not a timestamp")));
            },
        };
        DateTime::from_timestamp(secs, 0)
            .map(|dt| Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .ok_or_else(|| self.reject(format!("column {idx}: timestamp {secs} out of range")))
    }

    fn payload(&self, idx: usize) -> Result<Option<Value>, RejectedRow> {
        let raw: Option<String> = self.get(idx)?;
        parse_payload(self.table, self.id, raw.as_deref()).map_err(|e| self.reject(e))
    }
}

fn read_user(r: &RowReader<'_, '_>) -> Result<Record, RejectedRow> {
    Ok(Record::User(User {
        id: r.id,
        username: r.get(1)?,
        password_hash: r.get(2)?,
        created_at: r.timestamp(3)?,
    }))
}

fn read_character(r: &RowReader<'_, '_>) -> Result<Record, RejectedRow> {
    Ok(Record::Character(Character {
        id: r.id,
        user_id: r.get(1)?,
        name: r.get(2)?,
        data: r.payload(3)?,
        updated_at: r.timestamp(4)?,
    }))
}

fn read_campaign(r: &RowReader<'_, '_>) -> Result<Record, RejectedRow> {
    Ok(Record::Campaign(Campaign {
        id: r.id,
        user_id: r.get(1)?,
        name: r.get(2)?,
        description: r.get(3)?,
        created_at: r.timestamp(4)?,
        updated_at: r.timestamp(5)?,
    }))
}

fn read_session(r: &RowReader<'_, '_>) -> Result<Record, RejectedRow> {
    Ok(Record::Session(Session {
        id: r.id,
        campaign_id: r.get(1)?,
        user_id: r.get(2)?,
        session_number: r.get(3)?,
        date: r.get(4)?,
        location: r.get(5)?,
        status: r.get(6)?,
        data: r.payload(7)?,
        created_at: r.timestamp(8)?,
        updated_at: r.timestamp(9)?,
    }))
}
