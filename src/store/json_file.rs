// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{TransactionStore, sort_recent_first};
use crate::error::StorageError;
use crate::models::Transaction;

type Records = BTreeMap<i64, Transaction>;

/// Transaction store backed by a single JSON array file.
///
/// The whole array is rewritten on every mutation: serialized to a sibling
/// temp file, fsynced, then renamed over the original. The rewrite runs on
/// the blocking pool and the in-memory copy is only replaced after the rename
/// succeeds, so readers never wait on disk.
pub struct JsonFileStore {
    state: Arc<FileState>,
}

struct FileState {
    path: PathBuf,
    records: RwLock<Records>,
    // serializes rewrites of the file
    writer: Mutex<()>,
}

impl FileState {
    fn read(&self) -> RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonFileStore {
    /// Opens `path`, creating an empty store if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let records = if path.exists() {
            load(&path)?
        } else {
            BTreeMap::new()
        };
        tracing::info!(path = %path.display(), count = records.len(), "transaction file opened");
        Ok(Self {
            state: Arc::new(FileState {
                path,
                records: RwLock::new(records),
                writer: Mutex::new(()),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.state.path
    }

    async fn mutate<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Records) -> Result<(), StorageError> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let _writer = state.writer.lock().unwrap_or_else(PoisonError::into_inner);
            let mut next = state.read().clone();
            f(&mut next)?;
            persist(&state.path, &next)?;
            *state.records.write().unwrap_or_else(PoisonError::into_inner) = next;
            Ok(())
        })
        .await?
    }
}

fn load(path: &Path) -> Result<Records, StorageError> {
    let raw = fs::read(path).map_err(|e| StorageError::io(path, e))?;
    let list: Vec<Transaction> =
        serde_json::from_slice(&raw).map_err(|source| StorageError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    let mut records = BTreeMap::new();
    for tx in list {
        let id = tx.id;
        if records.insert(id, tx).is_some() {
            return Err(StorageError::InvalidData(format!(
                "duplicate transaction id {} in {}",
                id,
                path.display()
            )));
        }
    }
    Ok(records)
}

fn persist(path: &Path, records: &Records) -> Result<(), StorageError> {
    let mut list: Vec<Transaction> = records.values().cloned().collect();
    sort_recent_first(&mut list);
    let body =
        serde_json::to_vec_pretty(&list).map_err(|e| StorageError::InvalidData(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    let mut file = File::create(&tmp).map_err(|e| StorageError::io(&tmp, e))?;
    file.write_all(&body).map_err(|e| StorageError::io(&tmp, e))?;
    file.sync_all().map_err(|e| StorageError::io(&tmp, e))?;
    drop(file);
    fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))?;
    Ok(())
}

#[async_trait]
impl TransactionStore for JsonFileStore {
    async fn create_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let id = tx.id;
        let tx = tx.clone();
        self.mutate(move |records| {
            if records.contains_key(&tx.id) {
                return Err(StorageError::DuplicateKey(tx.id));
            }
            records.insert(tx.id, tx);
            Ok(())
        })
        .await?;
        tracing::debug!(id, "transaction created in file store");
        Ok(())
    }

    async fn update_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let id = tx.id;
        let tx = tx.clone();
        self.mutate(move |records| match records.get_mut(&tx.id) {
            Some(existing) => {
                *existing = tx;
                Ok(())
            }
            None => Err(StorageError::NotFound(tx.id)),
        })
        .await?;
        tracing::debug!(id, "transaction updated in file store");
        Ok(())
    }

    async fn delete_transaction(&self, id: i64) -> Result<(), StorageError> {
        self.mutate(move |records| {
            records
                .remove(&id)
                .map(|_| ())
                .ok_or(StorageError::NotFound(id))
        })
        .await?;
        tracing::debug!(id, "transaction deleted from file store");
        Ok(())
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>, StorageError> {
        Ok(self.state.read().get(&id).cloned())
    }

    async fn get_all_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        let mut all: Vec<Transaction> = self.state.read().values().cloned().collect();
        sort_recent_first(&mut all);
        Ok(all)
    }

    async fn get_transactions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError> {
        let mut hits: Vec<Transaction> = self
            .state
            .read()
            .values()
            .filter(|t| t.transaction_date >= from && t.transaction_date <= to)
            .cloned()
            .collect();
        sort_recent_first(&mut hits);
        Ok(hits)
    }

    async fn rekey_transaction(
        &self,
        old_id: i64,
        confirmed: &Transaction,
    ) -> Result<(), StorageError> {
        let new_id = confirmed.id;
        let confirmed = confirmed.clone();
        self.mutate(move |records| {
            records
                .remove(&old_id)
                .ok_or(StorageError::NotFound(old_id))?;
            records.insert(confirmed.id, confirmed);
            Ok(())
        })
        .await?;
        tracing::debug!(old_id, new_id, "transaction rekeyed in file store");
        Ok(())
    }

    async fn next_local_id(&self) -> Result<i64, StorageError> {
        Ok(self.state.read().keys().next_back().copied().unwrap_or(0) + 1)
    }
}
