// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StorageError;

/// Connection shared between async callers and the blocking pool.
pub type SharedConnection = Arc<Mutex<Connection>>;

pub fn open_or_init(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    tracing::info!(path = %path.display(), "database opened");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    // FULL so a committed write survives power loss, not just a crash.
    conn.pragma_update(None, "synchronous", "FULL")?;
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY,
        account_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        transaction_date TEXT NOT NULL,
        comment TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);

    -- one pending intent per transaction id; seq breaks timestamp ties
    CREATE TABLE IF NOT EXISTS backup_operations(
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL UNIQUE,
        action TEXT NOT NULL CHECK(action IN ('create','update','delete')),
        recorded_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_backup_operations_recorded ON backup_operations(recorded_at);
    "#,
    )?;
    Ok(())
}

/// Runs `f` with exclusive use of the connection on the blocking pool.
pub async fn run_blocking<T, E, F>(conn: &SharedConnection, f: F) -> Result<T, E>
where
    T: Send + 'static,
    E: From<tokio::task::JoinError> + Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
{
    let conn = Arc::clone(conn);
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    })
    .await?
}
