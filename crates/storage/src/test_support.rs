//! SQLite fixtures shared by the storage and service tests.

#![allow(clippy::unwrap_used, reason = "test code")]

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Schema of the Aedelore API's SQLite database, reduced to the migrated tables.
pub const SOURCE_SCHEMA: &str = r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE characters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        name TEXT NOT NULL,
        data TEXT NOT NULL,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE campaigns (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        name TEXT NOT NULL,
        description TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        session_number INTEGER NOT NULL,
        date TEXT,
        location TEXT,
        status TEXT DEFAULT 'active',
        data TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Bcrypt-style hash; the `$` markers must survive templating untouched.
pub const FIXTURE_HASH: &str = "$2b$10$abcdefghijklmnopqrstuv";

/// Create an empty source database with [`SOURCE_SCHEMA`].
pub fn create_source_db() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aedelore.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(SOURCE_SCHEMA).unwrap();
    (dir, path)
}

/// Rows used across tests:
///
/// - users 1, 3 (`O'Brien`), 7
/// - character 1 with a valid payload, character 2 with a broken one
/// - campaign 1 without description and an integer timestamp, campaign 2
/// - session 1 without status/date, session 4 `locked`
pub fn insert_fixture_rows(path: &Path) {
    let conn = Connection::open(path).unwrap();
    for (id, name, created) in
        [(1, "alice", "2024-01-01 08:00:00"), (3, "O'Brien", "2024-01-02 09:30:00"), (7, "zed", "2024-01-03 10:00:00")]
    {
        conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, FIXTURE_HASH, created],
        )
        .unwrap();
    }

    conn.execute(
        "INSERT INTO characters (id, user_id, name, data, updated_at) VALUES (1, 1, 'Aria', ?1, '2024-02-01 12:00:00')",
        params![r#"{"hp": 10, "items": ["sword"]}"#],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO characters (id, user_id, name, data, updated_at) VALUES (2, 3, 'Broken', '{hp: 10', NULL)",
        [],
    )
    .unwrap();

    conn.execute(
        "INSERT INTO campaigns (id, user_id, name, description, created_at, updated_at)
         VALUES (1, 1, 'Shadows', NULL, 1704067200, '2024-01-05 00:00:00')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO campaigns (id, user_id, name, description, created_at, updated_at)
         VALUES (2, 3, 'Second Dawn', 'A sequel', '2024-01-06 00:00:00', '2024-01-06 00:00:00')",
        [],
    )
    .unwrap();

    conn.execute(
        "INSERT INTO sessions (id, campaign_id, user_id, session_number, date, location, status, data, created_at, updated_at)
         VALUES (1, 1, 1, 1, NULL, NULL, NULL, '{\"notes\": []}', '2024-01-07 00:00:00', '2024-01-07 00:00:00')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO sessions (id, campaign_id, user_id, session_number, date, location, status, data, created_at, updated_at)
         VALUES (4, 2, 3, 2, '2024-01-08', 'Harbor', 'locked', '{\"hp\": 10, \"items\": [\"sword\"]}', '2024-01-08 00:00:00', NULL)",
        [],
    )
    .unwrap();
}
