//! Rows of the four migrated tables, as read from SQLite.

use serde_json::Value;

use crate::constants::DEFAULT_SESSION_STATUS;
use crate::{Column, ColumnKind, CoreError, InsertStatement, SqlValue, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub data: Option<Value>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub session_number: i64,
    pub date: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub data: Option<Value>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    User(User),
    Character(Character),
    Campaign(Campaign),
    Session(Session),
}

impl Record {
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::User(_) => Table::Users,
            Self::Character(_) => Table::Characters,
            Self::Campaign(_) => Table::Campaigns,
            Self::Session(_) => Table::Sessions,
        }
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::User(u) => u.id,
            Self::Character(c) => c.id,
            Self::Campaign(c) => c.id,
            Self::Session(s) => s.id,
        }
    }

    /// Insert statement for this row, with source defaults applied:
    /// empty strings for missing campaign descriptions and session
    /// date/location, `"active"` for a missing session status.
    #[must_use]
    pub fn to_insert(&self) -> InsertStatement {
        use ColumnKind::{Integer, Json, Key, Text, Timestamp};

        let columns = match self {
            Self::User(u) => vec![
                Column::new("id", Key, u.id),
                Column::new("username", Text, u.username.clone()),
                Column::new("password_hash", Text, u.password_hash.clone()),
                Column::new("created_at", Timestamp, u.created_at.clone()),
            ],
            Self::Character(c) => vec![
                Column::new("id", Key, c.id),
                Column::new("user_id", Key, c.user_id),
                Column::new("name", Text, c.name.clone()),
                Column::new("data", Json, payload_value(c.data.as_ref())),
                Column::new("updated_at", Timestamp, c.updated_at.clone()),
            ],
            Self::Campaign(c) => vec![
                Column::new("id", Key, c.id),
                Column::new("user_id", Key, c.user_id),
                Column::new("name", Text, c.name.clone()),
                Column::new("description", Text, or_empty(c.description.as_deref())),
                Column::new("created_at", Timestamp, c.created_at.clone()),
                Column::new("updated_at", Timestamp, c.updated_at.clone()),
            ],
            Self::Session(s) => vec![
                Column::new("id", Key, s.id),
                Column::new("campaign_id", Key, s.campaign_id),
                Column::new("user_id", Key, s.user_id),
                Column::new("session_number", Integer, s.session_number),
                Column::new("date", Text, or_empty(s.date.as_deref())),
                Column::new("location", Text, or_empty(s.location.as_deref())),
                Column::new(
                    "status",
                    Text,
                    non_empty(s.status.as_deref()).unwrap_or(DEFAULT_SESSION_STATUS),
                ),
                Column::new("data", Json, payload_value(s.data.as_ref())),
                Column::new("created_at", Timestamp, s.created_at.clone()),
                Column::new("updated_at", Timestamp, s.updated_at.clone()),
            ],
        };
        InsertStatement::new(self.table(), columns)
    }
}

/// Missing and empty both count as absent, like a falsy value would.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn or_empty(value: Option<&str>) -> &str {
    value.unwrap_or_default()
}

/// A missing payload and a JSON `null` payload are both SQL `NULL`.
fn payload_value(data: Option<&Value>) -> SqlValue {
    match data {
        None | Some(Value::Null) => SqlValue::Null,
        Some(doc) => SqlValue::Json(doc.clone()),
    }
}

/// Parse a JSON payload stored as text. `NULL` stays absent.
pub fn parse_payload(table: Table, id: i64, raw: Option<&str>) -> Result<Option<Value>, CoreError> {
    raw.map(|text| serde_json::from_str(text))
        .transpose()
        .map_err(|source| CoreError::InvalidPayload { table, id, source })
}
