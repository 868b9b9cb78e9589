// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use super::TransactionStore;
use crate::db::{self, SharedConnection};
use crate::error::StorageError;
use crate::models::Transaction;
use crate::utils::{fmt_timestamp, parse_timestamp};

const COLUMNS: &str =
    "id, account_id, category_id, amount, transaction_date, comment, created_at, updated_at";

/// Transaction store backed by the `transactions` table. Queries run on the
/// blocking pool.
pub struct SqliteStore {
    conn: SharedConnection,
}

impl SqliteStore {
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

    async fn query(
        &self,
        sql: String,
        from_to: Option<(String, String)>,
    ) -> Result<Vec<Transaction>, StorageError> {
        db::run_blocking(&self.conn, move |conn| -> Result<_, StorageError> {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = match &from_to {
                Some((from, to)) => stmt.query(params![from, to])?,
                None => stmt.query([])?,
            };
            let mut data = Vec::new();
            while let Some(r) = rows.next()? {
                data.push(read_row(r)?);
            }
            Ok(data)
        })
        .await
    }
}

fn read_row(r: &Row<'_>) -> Result<Transaction, StorageError> {
    let id: i64 = r.get(0)?;
    let amount: String = r.get(3)?;
    let date: String = r.get(4)?;
    let created: String = r.get(6)?;
    let updated: String = r.get(7)?;
    let bad = |what: &str, raw: &str| {
        StorageError::InvalidData(format!("transaction {}: bad {} '{}'", id, what, raw))
    };
    Ok(Transaction {
        id,
        account_id: r.get(1)?,
        category_id: r.get(2)?,
        amount: amount
            .parse::<Decimal>()
            .map_err(|_| bad("amount", &amount))?,
        transaction_date: parse_timestamp(&date).map_err(|_| bad("transaction_date", &date))?,
        comment: r.get(5)?,
        created_at: parse_timestamp(&created).map_err(|_| bad("created_at", &created))?,
        updated_at: parse_timestamp(&updated).map_err(|_| bad("updated_at", &updated))?,
    })
}

fn insert(conn: &Connection, tx: &Transaction, replace: bool) -> rusqlite::Result<usize> {
    let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
    conn.execute(
        &format!(
            "{} INTO transactions({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            verb, COLUMNS
        ),
        params![
            tx.id,
            tx.account_id,
            tx.category_id,
            tx.amount.to_string(),
            fmt_timestamp(&tx.transaction_date),
            tx.comment,
            fmt_timestamp(&tx.created_at),
            fmt_timestamp(&tx.updated_at),
        ],
    )
}

fn is_constraint(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn create_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let id = tx.id;
        let tx = tx.clone();
        db::run_blocking(&self.conn, move |conn| {
            insert(conn, &tx, false).map_err(|e| {
                if is_constraint(&e) {
                    StorageError::DuplicateKey(tx.id)
                } else {
                    StorageError::Database(e)
                }
            })
        })
        .await?;
        tracing::debug!(id, "transaction created in database");
        Ok(())
    }

    async fn update_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let id = tx.id;
        let tx = tx.clone();
        let n = db::run_blocking(&self.conn, move |conn| {
            conn.execute(
                "UPDATE transactions SET account_id=?2, category_id=?3, amount=?4, transaction_date=?5,
                 comment=?6, created_at=?7, updated_at=?8 WHERE id=?1",
                params![
                    tx.id,
                    tx.account_id,
                    tx.category_id,
                    tx.amount.to_string(),
                    fmt_timestamp(&tx.transaction_date),
                    tx.comment,
                    fmt_timestamp(&tx.created_at),
                    fmt_timestamp(&tx.updated_at),
                ],
            )
            .map_err(StorageError::from)
        })
        .await?;
        if n == 0 {
            return Err(StorageError::NotFound(id));
        }
        tracing::debug!(id, "transaction updated in database");
        Ok(())
    }

    async fn delete_transaction(&self, id: i64) -> Result<(), StorageError> {
        let n = db::run_blocking(&self.conn, move |conn| {
            conn.execute("DELETE FROM transactions WHERE id=?1", params![id])
                .map_err(StorageError::from)
        })
        .await?;
        if n == 0 {
            return Err(StorageError::NotFound(id));
        }
        tracing::debug!(id, "transaction deleted from database");
        Ok(())
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>, StorageError> {
        db::run_blocking(&self.conn, move |conn| -> Result<_, StorageError> {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM transactions WHERE id=?1", COLUMNS))?;
            let row = stmt
                .query_row(params![id], |r| Ok(read_row(r)))
                .optional()?;
            row.transpose()
        })
        .await
    }

    async fn get_all_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        self.query(
            format!(
                "SELECT {} FROM transactions ORDER BY transaction_date DESC, id DESC",
                COLUMNS
            ),
            None,
        )
        .await
    }

    async fn get_transactions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError> {
        self.query(
            format!(
                "SELECT {} FROM transactions WHERE transaction_date >= ?1 AND transaction_date <= ?2
                 ORDER BY transaction_date DESC, id DESC",
                COLUMNS
            ),
            Some((fmt_timestamp(&from), fmt_timestamp(&to))),
        )
        .await
    }

    async fn rekey_transaction(
        &self,
        old_id: i64,
        confirmed: &Transaction,
    ) -> Result<(), StorageError> {
        let new_id = confirmed.id;
        let confirmed = confirmed.clone();
        db::run_blocking(&self.conn, move |conn| -> Result<_, StorageError> {
            let tx = conn.transaction()?;
            let n = tx.execute("DELETE FROM transactions WHERE id=?1", params![old_id])?;
            if n == 0 {
                return Err(StorageError::NotFound(old_id));
            }
            insert(&tx, &confirmed, true)?;
            tx.commit()?;
            Ok(())
        })
        .await?;
        tracing::debug!(old_id, new_id, "transaction rekeyed in database");
        Ok(())
    }

    async fn next_local_id(&self) -> Result<i64, StorageError> {
        let max: Option<i64> = db::run_blocking(&self.conn, |conn| {
            conn.query_row("SELECT MAX(id) FROM transactions", [], |r| r.get(0))
                .map_err(StorageError::from)
        })
        .await?;
        Ok(max.unwrap_or(0) + 1)
    }
}
