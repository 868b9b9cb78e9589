// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Optimistic writes with write-back replay.
//!
//! Every mutation goes through the same steps:
//!
//! ```text
//! LocalPending -> LocalCommitted -> RemoteAttempting -> RemoteCommitted
//!                                                    \-> Queued
//! ```
//!
//! The local store is written first; a failure there ends the call with no
//! remote attempt. Dropping the caller's future while it waits for the
//! per-id lock has no effect. Once the lock is held, the local write and the
//! remote step run in their own task and finish even if the caller goes away.
//! A remote failure records a [`BackupOperation`](crate::models::BackupOperation)
//! and returns [`SyncError::Queued`]; the local change is kept.
//!
//! A mutation for an id that still has a queued operation is sent together
//! with it: the two are folded with [`BackupAction::merge`] and the result is
//! pushed, or nothing at all when a never-synced record is deleted.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};

use crate::account::AccountState;
use crate::backup::BackupQueue;
use crate::config::Config;
use crate::error::{QueueError, ReconciliationError, RemoteError, RetryClass, SyncError};
use crate::locks::KeyedLocks;
use crate::models::{
    Account, BackupAction, BackupOperation, Category, Direction, Transaction, TransactionDetails,
};
use crate::remote::{HttpGateway, NetworkClient, RemoteGateway};
use crate::resolve::resolve_transactions;
use crate::store::{JsonFileStore, TransactionStore};

const EVENT_CAPACITY: usize = 64;

/// Notifications for observers such as view models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The local store accepted a mutation.
    Committed { id: i64, action: BackupAction },
    /// The server confirmed a mutation. `id` is the server id, which differs
    /// from `local_id` when a provisional id was replaced.
    Synced {
        local_id: i64,
        id: i64,
        action: BackupAction,
    },
    /// The remote call failed and the mutation waits in the backup queue.
    Queued { id: i64, action: BackupAction },
    ReplayFinished { synced: usize, pending: usize },
}

#[derive(Debug)]
pub struct ReplayFailure {
    pub operation: BackupOperation,
    pub error: SyncError,
}

impl ReplayFailure {
    /// Local read failures are assumed transient.
    pub fn retry_class(&self) -> RetryClass {
        match &self.error {
            SyncError::Remote(e) => e.retry_class(),
            _ => RetryClass::Retryable,
        }
    }
}

/// Outcome of one [`SyncCoordinator::sync_backups`] pass.
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub synced: Vec<BackupOperation>,
    pub failed: Vec<ReplayFailure>,
}

impl ReplayReport {
    /// True when some entry failed because the token is no longer accepted.
    pub fn needs_reauth(&self) -> bool {
        self.failed
            .iter()
            .any(|f| f.retry_class() == RetryClass::ReauthRequired)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound on every remote call. Hitting it counts as a remote failure.
    pub remote_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        }
    }
}

struct Inner {
    store: Arc<dyn TransactionStore>,
    queue: Arc<BackupQueue>,
    gateway: Arc<dyn RemoteGateway>,
    locks: KeyedLocks,
    account: AccountState,
    events: broadcast::Sender<SyncEvent>,
    options: SyncOptions,
}

/// Entry point for the UI: local store, backup queue and remote gateway
/// behind one API. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        queue: Arc<BackupQueue>,
        gateway: Arc<dyn RemoteGateway>,
        options: SyncOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                queue,
                gateway,
                locks: KeyedLocks::new(),
                account: AccountState::new(),
                events,
                options,
            }),
        }
    }

    /// JSON file store, SQLite backup queue and HTTP gateway under
    /// `cfg.data_dir`.
    pub fn open(cfg: &Config) -> anyhow::Result<Self> {
        let store = JsonFileStore::open(cfg.transactions_path())?;
        let queue = BackupQueue::open(&cfg.db_path())?;
        let gateway = HttpGateway::new(NetworkClient::from_config(cfg)?);
        Ok(Self::new(
            Arc::new(store),
            Arc::new(queue),
            Arc::new(gateway),
            SyncOptions {
                remote_timeout: cfg.request_timeout,
            },
        ))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    pub fn account_updates(&self) -> watch::Receiver<Option<Account>> {
        self.inner.account.subscribe()
    }

    pub fn current_account(&self) -> Option<Account> {
        self.inner.account.current()
    }

    // ---- writes -----------------------------------------------------------

    /// Stores `tx` locally, then creates it remotely. On success the record is
    /// replaced by the server's copy (server id wins) and returned.
    pub async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, SyncError> {
        let guard = self.inner.locks.lock(tx.id).await;
        let inner = Arc::clone(&self.inner);
        detach(async move {
            let _guard = guard;
            inner.store.create_transaction(&tx).await?;
            inner.committed(tx.id, BackupAction::Create);
            inner.push_write(tx, BackupAction::Create).await
        })
        .await
    }

    /// While a create for the same id is still queued, the edited record is
    /// sent as that create.
    pub async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, SyncError> {
        let guard = self.inner.locks.lock(tx.id).await;
        let inner = Arc::clone(&self.inner);
        detach(async move {
            let _guard = guard;
            inner.store.update_transaction(&tx).await?;
            inner.committed(tx.id, BackupAction::Update);
            inner.push_write(tx, BackupAction::Update).await
        })
        .await
    }

    /// Deleting an id the store does not hold fails with `NotFound` and
    /// queues nothing. Deleting a record whose create is still queued drops
    /// that create without calling the server.
    pub async fn delete_transaction(&self, id: i64) -> Result<(), SyncError> {
        let guard = self.inner.locks.lock(id).await;
        let inner = Arc::clone(&self.inner);
        detach(async move {
            let _guard = guard;
            inner.store.delete_transaction(id).await?;
            inner.committed(id, BackupAction::Delete);
            inner.push_removal(id).await
        })
        .await
    }

    /// Replays queued operations oldest first. A failing entry stays queued
    /// and does not stop the pass. Only fails if the queue cannot be read.
    pub async fn sync_backups(&self) -> Result<ReplayReport, SyncError> {
        let pending = self.inner.queue.get_unsynced_operations().await?;
        let mut report = ReplayReport::default();

        for listed in pending {
            let _guard = self.inner.locks.lock(listed.transaction_id).await;
            // a write may have sent or folded the entry while we waited
            let Some(op) = self.inner.queue.pending_for(listed.transaction_id).await? else {
                continue;
            };
            match self.inner.replay(&op).await {
                Ok(()) => {
                    self.inner.forget(op.transaction_id).await;
                    report.synced.push(op);
                }
                Err(error) => {
                    tracing::warn!(
                        id = op.transaction_id,
                        action = %op.action,
                        error = %error,
                        "replay failed, keeping operation queued"
                    );
                    report.failed.push(ReplayFailure {
                        operation: op,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            synced = report.synced.len(),
            pending = report.failed.len(),
            "backup replay finished"
        );
        self.inner.emit(SyncEvent::ReplayFinished {
            synced: report.synced.len(),
            pending: report.failed.len(),
        });
        Ok(report)
    }

    pub async fn pending_operations(&self) -> Result<Vec<BackupOperation>, SyncError> {
        Ok(self.inner.queue.get_unsynced_operations().await?)
    }

    // ---- reads ------------------------------------------------------------

    /// Provisional id for an offline create. Ids with a queued operation are
    /// never handed out again, even once deleted locally.
    pub async fn next_transaction_id(&self) -> Result<i64, SyncError> {
        let local = self.inner.store.next_local_id().await?;
        let queued = self
            .inner
            .queue
            .get_unsynced_operations()
            .await?
            .iter()
            .map(|op| op.transaction_id + 1)
            .max()
            .unwrap_or(1);
        Ok(local.max(queued))
    }

    pub async fn transaction(&self, id: i64) -> Result<Option<Transaction>, SyncError> {
        Ok(self.inner.store.get_transaction(id).await?)
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>, SyncError> {
        Ok(self.inner.store.get_all_transactions().await?)
    }

    pub async fn transactions_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, SyncError> {
        Ok(self.inner.store.get_transactions(from, to).await?)
    }

    /// Local transactions in `[from, to]` joined with accounts and categories
    /// fetched once from the server.
    pub async fn details_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TransactionDetails>, SyncError> {
        let local = self.inner.store.get_transactions(from, to).await?;
        let (accounts, categories) = tokio::try_join!(
            self.inner.remote(self.inner.gateway.fetch_accounts()),
            self.inner.remote(self.inner.gateway.fetch_categories()),
        )?;
        Ok(resolve_transactions(local, &accounts, &categories)?)
    }

    /// Categories from the server, optionally restricted to one direction.
    pub async fn categories(
        &self,
        direction: Option<Direction>,
    ) -> Result<Vec<Category>, SyncError> {
        let all = self
            .inner
            .remote(self.inner.gateway.fetch_categories())
            .await?;
        Ok(all
            .into_iter()
            .filter(|c| direction.is_none_or(|d| c.direction() == d))
            .collect())
    }

    /// Fetches the account's transactions for a period and upserts them into
    /// the local store. Ids with a pending backup operation are left alone:
    /// the local copy is newer than the server's. Returns how many records
    /// were written.
    pub async fn pull_period(
        &self,
        account_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize, SyncError> {
        let remote = self
            .inner
            .remote(self.inner.gateway.fetch_transactions(account_id, from, to))
            .await?;
        let pending: std::collections::HashSet<i64> = self
            .inner
            .queue
            .get_unsynced_operations()
            .await?
            .into_iter()
            .map(|op| op.transaction_id)
            .collect();

        let mut written = 0;
        for tx in remote {
            if pending.contains(&tx.id) {
                tracing::debug!(id = tx.id, "skipping pulled transaction with pending changes");
                continue;
            }
            let _guard = self.inner.locks.lock(tx.id).await;
            match self.inner.store.get_transaction(tx.id).await? {
                Some(existing) if existing == tx => continue,
                Some(_) => self.inner.store.update_transaction(&tx).await?,
                None => self.inner.store.create_transaction(&tx).await?,
            }
            written += 1;
        }
        tracing::info!(account_id, written, "pulled remote transactions");
        Ok(written)
    }

    /// Fetches the account and publishes it to [`account_updates`](Self::account_updates).
    pub async fn refresh_account(&self) -> Result<Account, ReconciliationError> {
        self.inner.refresh_account().await
    }
}

/// Runs the remote phase on its own task so it outlives a cancelled caller.
async fn detach<T, F>(fut: F) -> Result<T, SyncError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, SyncError>> + Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| SyncError::Interrupted(e.to_string()))?
}

impl Inner {
    fn emit(&self, event: SyncEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn committed(&self, id: i64, action: BackupAction) {
        tracing::debug!(id, action = %action, "committed locally");
        self.emit(SyncEvent::Committed { id, action });
    }

    async fn remote<T, F>(&self, fut: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        let limit = self.options.remote_timeout;
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RemoteError::Timeout(limit))?
    }

    async fn enqueue(&self, id: i64, action: BackupAction, source: RemoteError) -> SyncError {
        tracing::warn!(id, action = %action, error = %source, "remote call failed, queued for replay");
        self.queue.add_operation(id, action).await;
        self.emit(SyncEvent::Queued { id, action });
        SyncError::Queued { id, action, source }
    }

    /// Drops the queued entry for `id` once the server has what it describes.
    async fn forget(&self, id: i64) {
        match self.queue.clear_synced_operation(id).await {
            Ok(()) | Err(QueueError::NotFound(_)) => {}
            Err(e) => tracing::error!(id, error = %e, "synced operation could not be cleared"),
        }
    }

    /// Remote phase of a local create or update.
    async fn push_write(
        &self,
        tx: Transaction,
        action: BackupAction,
    ) -> Result<Transaction, SyncError> {
        let id = tx.id;
        let pending = self.queue.pending_for(id).await?.map(|op| op.action);
        let effective = pending.map_or(Some(action), |p| BackupAction::merge(p, action));
        // writes never fold into a delete
        let pushed = if effective == Some(BackupAction::Create) {
            self.push_create(tx).await
        } else {
            self.push_update(tx).await
        };
        match pushed {
            Ok(confirmed) => {
                if pending.is_some() {
                    self.forget(id).await;
                }
                Ok(confirmed)
            }
            Err(source) => Err(self.enqueue(id, action, source).await),
        }
    }

    /// Remote phase of a local delete.
    async fn push_removal(&self, id: i64) -> Result<(), SyncError> {
        let pending = self.queue.pending_for(id).await?.map(|op| op.action);
        if pending.is_some_and(|p| BackupAction::merge(p, BackupAction::Delete).is_none()) {
            tracing::info!(id, "never synced, dropping queued create");
            self.forget(id).await;
            return Ok(());
        }
        match self.push_delete(id).await {
            Ok(()) => {
                if pending.is_some() {
                    self.forget(id).await;
                }
                Ok(())
            }
            Err(source) => Err(self.enqueue(id, BackupAction::Delete, source).await),
        }
    }

    async fn push_create(&self, tx: Transaction) -> Result<Transaction, RemoteError> {
        let confirmed = self.remote(self.gateway.create_transaction(&tx)).await?;
        let result = if confirmed.id == tx.id {
            self.store.update_transaction(&confirmed).await
        } else {
            self.store.rekey_transaction(tx.id, &confirmed).await
        };
        if let Err(source) = result {
            log_reconciliation(ReconciliationError::Store { id: tx.id, source });
        }
        self.synced(tx.id, confirmed.id, BackupAction::Create).await;
        Ok(confirmed)
    }

    async fn push_update(&self, tx: Transaction) -> Result<Transaction, RemoteError> {
        let confirmed = self.remote(self.gateway.update_transaction(&tx)).await?;
        if let Err(source) = self.store.update_transaction(&confirmed).await {
            log_reconciliation(ReconciliationError::Store { id: tx.id, source });
        }
        self.synced(tx.id, confirmed.id, BackupAction::Update).await;
        Ok(confirmed)
    }

    async fn push_delete(&self, id: i64) -> Result<(), RemoteError> {
        self.remote(self.gateway.delete_transaction(id)).await?;
        self.synced(id, id, BackupAction::Delete).await;
        Ok(())
    }

    async fn synced(&self, local_id: i64, id: i64, action: BackupAction) {
        tracing::info!(local_id, id, action = %action, "remote commit confirmed");
        self.emit(SyncEvent::Synced {
            local_id,
            id,
            action,
        });
        if let Err(e) = self.refresh_account().await {
            log_reconciliation(e);
        }
    }

    async fn refresh_account(&self) -> Result<Account, ReconciliationError> {
        let account = self
            .remote(self.gateway.fetch_account())
            .await
            .map_err(ReconciliationError::AccountRefresh)?;
        self.account.replace(account.clone());
        Ok(account)
    }

    /// Pushes one queued operation using the current local record.
    async fn replay(&self, op: &BackupOperation) -> Result<(), SyncError> {
        let id = op.transaction_id;
        match op.action {
            BackupAction::Create | BackupAction::Update => {
                let Some(local) = self.store.get_transaction(id).await? else {
                    tracing::info!(
                        id,
                        action = %op.action,
                        "record gone locally, dropping stale operation"
                    );
                    return Ok(());
                };
                if op.action == BackupAction::Create {
                    self.push_create(local).await?;
                } else {
                    self.push_update(local).await?;
                }
                Ok(())
            }
            BackupAction::Delete => match self.push_delete(id).await {
                Ok(()) => Ok(()),
                Err(RemoteError::NotFound) => {
                    tracing::debug!(id, "already deleted remotely");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
        }
    }
}

fn log_reconciliation(e: ReconciliationError) {
    tracing::warn!(error = %e, "reconciliation after sync failed");
}
