// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use moneysync::{
    Account, BackupQueue, Category, RemoteError, RemoteGateway, SqliteStore, SyncCoordinator,
    SyncOptions, Transaction, TransactionStore,
};
use rust_decimal::Decimal;

pub const OPENING_BALANCE: i64 = 1000;

pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn tx(id: i64, amount: &str, day: u32) -> Transaction {
    Transaction::new_local(id, 1, 2, dec(amount), ts(day, 12), None, ts(day, 12))
}

pub fn account(balance: Decimal) -> Account {
    Account {
        id: 1,
        user_id: 1,
        name: "Main".into(),
        balance,
        currency: "RUB".into(),
        created_at: ts(1, 0),
        updated_at: ts(1, 0),
    }
}

pub fn categories() -> Vec<Category> {
    vec![
        Category::new(1, "Salary", true, "💰").unwrap(),
        Category::new(2, "Groceries", false, "🛒").unwrap(),
        Category::new(3, "Rent", false, "🏠").unwrap(),
    ]
}

#[derive(Default)]
struct State {
    remote: BTreeMap<i64, Transaction>,
    fail_all: Option<RemoteError>,
    fail_ids: HashMap<i64, RemoteError>,
    account_error: Option<RemoteError>,
    next_server_id: Option<i64>,
    delay: Option<Duration>,
    calls: Vec<String>,
}

/// In-memory server with scripted failures.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<State>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails with `err` until [`recover`](Self::recover).
    pub fn fail_all(&self, err: RemoteError) {
        self.state.lock().unwrap().fail_all = Some(err);
    }

    /// Writes for `id` fail with `err` until [`recover`](Self::recover).
    pub fn fail_id(&self, id: i64, err: RemoteError) {
        self.state.lock().unwrap().fail_ids.insert(id, err);
    }

    pub fn recover(&self) {
        let mut s = self.state.lock().unwrap();
        s.fail_all = None;
        s.fail_ids.clear();
    }

    pub fn fail_account_refresh(&self, err: RemoteError) {
        self.state.lock().unwrap().account_error = Some(err);
    }

    /// Creates get server ids counting up from `first` instead of echoing
    /// the client's id.
    pub fn assign_ids_from(&self, first: i64) {
        self.state.lock().unwrap().next_server_id = Some(first);
    }

    pub fn delay_writes(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn seed(&self, tx: Transaction) {
        self.state.lock().unwrap().remote.insert(tx.id, tx);
    }

    pub fn remote(&self) -> BTreeMap<i64, Transaction> {
        self.state.lock().unwrap().remote.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    async fn before_write(&self, call: String, id: i64) -> Result<(), RemoteError> {
        let delay = {
            let mut s = self.state.lock().unwrap();
            s.calls.push(call);
            s.delay
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let s = self.state.lock().unwrap();
        if let Some(err) = s.fail_all.clone().or_else(|| s.fail_ids.get(&id).cloned()) {
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn create_transaction(&self, tx: &Transaction) -> Result<Transaction, RemoteError> {
        self.before_write(format!("create {}", tx.id), tx.id).await?;
        let mut s = self.state.lock().unwrap();
        let mut confirmed = tx.clone();
        if let Some(next) = s.next_server_id.as_mut() {
            confirmed.id = *next;
            *next += 1;
        }
        s.remote.insert(confirmed.id, confirmed.clone());
        Ok(confirmed)
    }

    async fn update_transaction(&self, tx: &Transaction) -> Result<Transaction, RemoteError> {
        self.before_write(format!("update {}", tx.id), tx.id).await?;
        let mut s = self.state.lock().unwrap();
        if !s.remote.contains_key(&tx.id) {
            return Err(RemoteError::NotFound);
        }
        s.remote.insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn delete_transaction(&self, id: i64) -> Result<(), RemoteError> {
        self.before_write(format!("delete {}", id), id).await?;
        let mut s = self.state.lock().unwrap();
        s.remote.remove(&id).map(|_| ()).ok_or(RemoteError::NotFound)
    }

    async fn fetch_account(&self) -> Result<Account, RemoteError> {
        let s = self.state.lock().unwrap();
        if let Some(err) = s.account_error.clone() {
            return Err(err);
        }
        let spent: Decimal = s.remote.values().map(|t| t.amount).sum();
        Ok(account(Decimal::from(OPENING_BALANCE) - spent))
    }

    async fn fetch_accounts(&self) -> Result<Vec<Account>, RemoteError> {
        Ok(vec![self.fetch_account().await?])
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, RemoteError> {
        Ok(categories())
    }

    async fn fetch_transactions(
        &self,
        account_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RemoteError> {
        let s = self.state.lock().unwrap();
        Ok(s.remote
            .values()
            .filter(|t| t.account_id == account_id)
            .filter(|t| t.transaction_date >= from && t.transaction_date <= to)
            .cloned()
            .collect())
    }
}

pub struct Harness {
    pub coord: SyncCoordinator,
    pub store: Arc<SqliteStore>,
    pub queue: Arc<BackupQueue>,
    pub gateway: FakeGateway,
}

pub fn harness() -> Harness {
    harness_with(SyncOptions::default())
}

pub fn harness_with(options: SyncOptions) -> Harness {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let queue = Arc::new(BackupQueue::in_memory().unwrap());
    let gateway = FakeGateway::new();
    let coord = SyncCoordinator::new(
        store.clone() as Arc<dyn TransactionStore>,
        queue.clone(),
        Arc::new(gateway.clone()),
        options,
    );
    Harness {
        coord,
        store,
        queue,
        gateway,
    }
}
