// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Durable on-device transaction storage.
//!
//! Every mutating call has reached disk by the time it returns `Ok`, so a
//! restart right after a successful call never loses the write.

pub mod json_file;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::models::Transaction;

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new record. Fails with `DuplicateKey` if the id is taken.
    async fn create_transaction(&self, tx: &Transaction) -> Result<(), StorageError>;

    /// Replaces every mutable field of the record with `tx.id`.
    async fn update_transaction(&self, tx: &Transaction) -> Result<(), StorageError>;

    async fn delete_transaction(&self, id: i64) -> Result<(), StorageError>;

    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>, StorageError>;

    /// All records, most recent transaction date first.
    async fn get_all_transactions(&self) -> Result<Vec<Transaction>, StorageError>;

    /// Records dated within `[from, to]`, most recent first.
    async fn get_transactions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError>;

    /// Swaps the provisional record `old_id` for the server-confirmed one in
    /// a single write. A local record already holding `confirmed.id` is
    /// overwritten.
    async fn rekey_transaction(
        &self,
        old_id: i64,
        confirmed: &Transaction,
    ) -> Result<(), StorageError>;

    /// Provisional id for an offline create: max(existing) + 1.
    async fn next_local_id(&self) -> Result<i64, StorageError> {
        let all = self.get_all_transactions().await?;
        Ok(all.iter().map(|t| t.id).max().unwrap_or(0) + 1)
    }
}

/// Default presentation order: date descending, then id descending.
pub(crate) fn sort_recent_first(records: &mut [Transaction]) {
    records.sort_by(|a, b| {
        b.transaction_date
            .cmp(&a.transaction_date)
            .then(b.id.cmp(&a.id))
    });
}
