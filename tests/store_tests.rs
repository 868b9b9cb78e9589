// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{dec, ts, tx};
use moneysync::{JsonFileStore, SqliteStore, StorageError, TransactionStore};
use serde_json::Value;
use tempfile::tempdir;

async fn crud_contract(store: &dyn TransactionStore) {
    let t = tx(1, "12.50", 3);
    store.create_transaction(&t).await.unwrap();
    assert_eq!(store.get_transaction(1).await.unwrap(), Some(t.clone()));
    assert_eq!(store.get_transaction(2).await.unwrap(), None);

    let err = store.create_transaction(&tx(1, "1", 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::DuplicateKey(1)));
    assert_eq!(store.get_transaction(1).await.unwrap(), Some(t.clone()));

    let mut edited = t.clone();
    edited.amount = dec("-4.20");
    edited.comment = Some("coffee".into());
    store.update_transaction(&edited).await.unwrap();
    store.update_transaction(&edited).await.unwrap();
    assert_eq!(store.get_transaction(1).await.unwrap(), Some(edited));

    let err = store.update_transaction(&tx(9, "1", 1)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(9)));
    assert_eq!(store.get_transaction(9).await.unwrap(), None);

    store.delete_transaction(1).await.unwrap();
    assert_eq!(store.get_transaction(1).await.unwrap(), None);
    let err = store.delete_transaction(1).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(1)));
}

async fn range_contract(store: &dyn TransactionStore) {
    for (id, day) in [(1, 1), (2, 5), (3, 10), (4, 5)] {
        store.create_transaction(&tx(id, "1", day)).await.unwrap();
    }

    let all: Vec<i64> = store
        .get_all_transactions()
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(all, vec![3, 4, 2, 1]);

    // both ends are inclusive
    let hits: Vec<i64> = store
        .get_transactions(ts(5, 12), ts(10, 12))
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(hits, vec![3, 4, 2]);

    assert!(
        store
            .get_transactions(ts(10, 13), ts(1, 0))
            .await
            .unwrap()
            .is_empty()
    );
}

async fn rekey_contract(store: &dyn TransactionStore) {
    assert_eq!(store.next_local_id().await.unwrap(), 1);
    store.create_transaction(&tx(1, "1", 1)).await.unwrap();
    store.create_transaction(&tx(2, "2", 2)).await.unwrap();
    assert_eq!(store.next_local_id().await.unwrap(), 3);

    let mut confirmed = tx(2, "2", 2);
    confirmed.id = 500;
    store.rekey_transaction(2, &confirmed).await.unwrap();
    assert_eq!(store.get_transaction(2).await.unwrap(), None);
    assert_eq!(store.get_transaction(500).await.unwrap(), Some(confirmed.clone()));
    assert_eq!(store.next_local_id().await.unwrap(), 501);

    let err = store.rekey_transaction(2, &confirmed).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(2)));
}

#[tokio::test]
async fn sqlite_store_contract() {
    crud_contract(&SqliteStore::in_memory().unwrap()).await;
    range_contract(&SqliteStore::in_memory().unwrap()).await;
    rekey_contract(&SqliteStore::in_memory().unwrap()).await;
}

#[tokio::test]
async fn json_store_contract() {
    let dir = tempdir().unwrap();
    crud_contract(&JsonFileStore::open(dir.path().join("a.json")).unwrap()).await;
    range_contract(&JsonFileStore::open(dir.path().join("b.json")).unwrap()).await;
    rekey_contract(&JsonFileStore::open(dir.path().join("c.json")).unwrap()).await;
}

#[tokio::test]
async fn json_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("transactions.json");
    let mut precise = tx(2, "0.10", 4);
    precise.transaction_date = "2025-06-04T09:15:30.123456789Z".parse().unwrap();
    precise.comment = Some("Обед".into());
    {
        let store = JsonFileStore::open(&path).unwrap();
        store.create_transaction(&tx(1, "12.50", 3)).await.unwrap();
        store.create_transaction(&precise).await.unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get_transaction(2).await.unwrap(), Some(precise));
    assert_eq!(reopened.get_all_transactions().await.unwrap().len(), 2);
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn json_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("transactions.json");
    let store = JsonFileStore::open(&path).unwrap();
    store.create_transaction(&tx(5, "12.50", 3)).await.unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let rec = &doc.as_array().unwrap()[0];
    assert_eq!(rec["id"], 5);
    assert_eq!(rec["accountId"], 1);
    assert_eq!(rec["categoryId"], 2);
    assert_eq!(rec["amount"], "12.50");
    assert_eq!(rec["transactionDate"], "2025-06-03T12:00:00Z");
    assert!(rec.get("comment").is_none());
}

#[tokio::test]
async fn malformed_json_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("transactions.json");
    std::fs::write(&path, "[{\"id\": 1,").unwrap();
    let err = JsonFileStore::open(&path).err().unwrap();
    assert!(matches!(err, StorageError::Malformed { .. }));
}

#[tokio::test]
async fn sqlite_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("moneysync.sqlite");
    {
        let store = SqliteStore::open(&path).unwrap();
        store.create_transaction(&tx(1, "12.50", 3)).await.unwrap();
    }
    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.get_transaction(1).await.unwrap(), Some(tx(1, "12.50", 3)));
}
