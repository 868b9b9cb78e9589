// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Durable log of remote mutations that still need to be replayed.
//!
//! At most one operation is pending per transaction id. A later failure for
//! the same id is folded into the pending entry with [`BackupAction::merge`]
//! and keeps the original timestamp, so replay order stays stable.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::db::{self, SharedConnection};
use crate::error::{QueueError, StorageError};
use crate::models::{BackupAction, BackupOperation};
use crate::utils::{fmt_timestamp, parse_timestamp};

/// SQLite work runs on the blocking pool; every method is safe to await from
/// any runtime worker.
pub struct BackupQueue {
    conn: SharedConnection,
}

impl BackupQueue {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::from_connection(db::open_or_init(path)?))
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    /// Wraps a connection whose schema is already initialised.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Records a failed remote mutation. Never fails the caller: if the queue
    /// itself cannot be written the error is logged and dropped.
    pub async fn add_operation(&self, transaction_id: i64, action: BackupAction) {
        match self.try_add_operation(transaction_id, action).await {
            Ok(Some(op)) => tracing::info!(
                id = transaction_id,
                requested = %action,
                pending = %op.action,
                "backup operation recorded"
            ),
            Ok(None) => tracing::info!(
                id = transaction_id,
                requested = %action,
                "backup operation cancelled out"
            ),
            Err(e) => tracing::error!(
                id = transaction_id,
                action = %action,
                error = %e,
                "failed to record backup operation"
            ),
        }
    }

    /// Like [`add_operation`](Self::add_operation) but reports the outcome:
    /// the pending operation after collapsing, or `None` when the new action
    /// cancelled the pending one and the entry was removed.
    pub async fn try_add_operation(
        &self,
        transaction_id: i64,
        action: BackupAction,
    ) -> Result<Option<BackupOperation>, QueueError> {
        db::run_blocking(&self.conn, move |conn| -> Result<_, QueueError> {
            let tx = conn.transaction()?;
            let existing: Option<(String, String)> = tx
                .query_row(
                    "SELECT action, recorded_at FROM backup_operations WHERE transaction_id=?1",
                    params![transaction_id],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;

            let op = match existing {
                Some((pending, recorded_at)) => {
                    match BackupAction::merge(parse_action(&pending)?, action) {
                        Some(merged) => {
                            tx.execute(
                                "UPDATE backup_operations SET action=?2 WHERE transaction_id=?1",
                                params![transaction_id, merged.as_str()],
                            )?;
                            Some(BackupOperation {
                                transaction_id,
                                action: merged,
                                timestamp: parse_recorded(&recorded_at)?,
                            })
                        }
                        None => {
                            tx.execute(
                                "DELETE FROM backup_operations WHERE transaction_id=?1",
                                params![transaction_id],
                            )?;
                            None
                        }
                    }
                }
                None => {
                    let now = Utc::now();
                    tx.execute(
                        "INSERT INTO backup_operations(transaction_id, action, recorded_at)
                         VALUES (?1, ?2, ?3)",
                        params![transaction_id, action.as_str(), fmt_timestamp(&now)],
                    )?;
                    Some(BackupOperation {
                        transaction_id,
                        action,
                        timestamp: now,
                    })
                }
            };
            tx.commit()?;
            Ok(op)
        })
        .await
    }

    /// Pending operations, oldest first.
    pub async fn get_unsynced_operations(&self) -> Result<Vec<BackupOperation>, QueueError> {
        db::run_blocking(&self.conn, |conn| -> Result<_, QueueError> {
            let mut stmt = conn.prepare(
                "SELECT transaction_id, action, recorded_at FROM backup_operations
                 ORDER BY recorded_at ASC, seq ASC",
            )?;
            let mut rows = stmt.query([])?;
            let mut data = Vec::new();
            while let Some(r) = rows.next()? {
                data.push(read_operation(r)?);
            }
            Ok(data)
        })
        .await
    }

    pub async fn pending_for(
        &self,
        transaction_id: i64,
    ) -> Result<Option<BackupOperation>, QueueError> {
        db::run_blocking(&self.conn, move |conn| -> Result<_, QueueError> {
            let mut stmt = conn.prepare(
                "SELECT transaction_id, action, recorded_at FROM backup_operations
                 WHERE transaction_id=?1",
            )?;
            let mut rows = stmt.query(params![transaction_id])?;
            let op = match rows.next()? {
                Some(r) => Some(read_operation(r)?),
                None => None,
            };
            Ok(op)
        })
        .await
    }

    /// Removes the pending operation for `transaction_id` after a successful
    /// replay. `NotFound` when there is none; callers racing on the same id
    /// should tolerate it.
    pub async fn clear_synced_operation(&self, transaction_id: i64) -> Result<(), QueueError> {
        let n = db::run_blocking(&self.conn, move |conn| {
            conn.execute(
                "DELETE FROM backup_operations WHERE transaction_id=?1",
                params![transaction_id],
            )
            .map_err(QueueError::from)
        })
        .await?;
        if n == 0 {
            return Err(QueueError::NotFound(transaction_id));
        }
        tracing::debug!(id = transaction_id, "backup operation cleared");
        Ok(())
    }

    pub async fn len(&self) -> Result<usize, QueueError> {
        let n: i64 = db::run_blocking(&self.conn, |conn| {
            conn.query_row("SELECT COUNT(*) FROM backup_operations", [], |r| r.get(0))
                .map_err(QueueError::from)
        })
        .await?;
        Ok(n as usize)
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }
}

fn read_operation(r: &rusqlite::Row<'_>) -> Result<BackupOperation, QueueError> {
    let action: String = r.get(1)?;
    let recorded_at: String = r.get(2)?;
    Ok(BackupOperation {
        transaction_id: r.get(0)?,
        action: parse_action(&action)?,
        timestamp: parse_recorded(&recorded_at)?,
    })
}

fn parse_action(s: &str) -> Result<BackupAction, QueueError> {
    s.parse().map_err(QueueError::InvalidData)
}

fn parse_recorded(s: &str) -> Result<chrono::DateTime<Utc>, QueueError> {
    parse_timestamp(s).map_err(|e| QueueError::InvalidData(e.to_string()))
}
