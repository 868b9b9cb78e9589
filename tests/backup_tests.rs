// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneysync::{BackupAction, BackupQueue, QueueError};
use tempfile::tempdir;

#[tokio::test]
async fn pending_operations_come_back_oldest_first() {
    let q = BackupQueue::in_memory().unwrap();
    q.add_operation(3, BackupAction::Create).await;
    q.add_operation(1, BackupAction::Delete).await;
    q.add_operation(2, BackupAction::Update).await;

    let ids: Vec<i64> = q
        .get_unsynced_operations()
        .await
        .unwrap()
        .iter()
        .map(|op| op.transaction_id)
        .collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn one_pending_operation_per_transaction() {
    let q = BackupQueue::in_memory().unwrap();
    let first = q
        .try_add_operation(7, BackupAction::Create)
        .await
        .unwrap()
        .unwrap();
    q.add_operation(8, BackupAction::Update).await;

    let merged = q
        .try_add_operation(7, BackupAction::Update)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(merged.action, BackupAction::Create);
    assert_eq!(merged.timestamp, first.timestamp);

    let ops = q.get_unsynced_operations().await.unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].transaction_id, 7);
    assert_eq!(q.len().await.unwrap(), 2);
}

#[tokio::test]
async fn delete_of_unsynced_create_leaves_nothing() {
    let q = BackupQueue::in_memory().unwrap();
    q.add_operation(7, BackupAction::Create).await;
    q.add_operation(7, BackupAction::Update).await;

    let outcome = q.try_add_operation(7, BackupAction::Delete).await.unwrap();
    assert_eq!(outcome, None);
    assert_eq!(q.pending_for(7).await.unwrap(), None);
    assert!(q.is_empty().await.unwrap());
}

#[tokio::test]
async fn update_then_delete_keeps_the_delete() {
    let q = BackupQueue::in_memory().unwrap();
    q.add_operation(4, BackupAction::Update).await;
    q.add_operation(4, BackupAction::Update).await;
    assert_eq!(
        q.pending_for(4).await.unwrap().unwrap().action,
        BackupAction::Update
    );
    q.add_operation(4, BackupAction::Delete).await;
    assert_eq!(
        q.pending_for(4).await.unwrap().unwrap().action,
        BackupAction::Delete
    );
}

#[tokio::test]
async fn recreate_over_pending_delete_keeps_its_place() {
    let q = BackupQueue::in_memory().unwrap();
    let deleted = q
        .try_add_operation(5, BackupAction::Delete)
        .await
        .unwrap()
        .unwrap();
    q.add_operation(6, BackupAction::Create).await;

    let folded = q
        .try_add_operation(5, BackupAction::Create)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(folded.action, BackupAction::Update);
    assert_eq!(folded.timestamp, deleted.timestamp);
    let ops = q.get_unsynced_operations().await.unwrap();
    assert_eq!(ops[0].transaction_id, 5);
}

#[tokio::test]
async fn clearing_removes_only_that_transaction() {
    let q = BackupQueue::in_memory().unwrap();
    q.add_operation(1, BackupAction::Create).await;
    q.add_operation(2, BackupAction::Create).await;

    q.clear_synced_operation(1).await.unwrap();
    let ops = q.get_unsynced_operations().await.unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].transaction_id, 2);

    assert!(matches!(
        q.clear_synced_operation(1).await,
        Err(QueueError::NotFound(1))
    ));
}

#[tokio::test]
async fn queue_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("moneysync.sqlite");
    {
        let q = BackupQueue::open(&path).unwrap();
        q.add_operation(5, BackupAction::Create).await;
        q.add_operation(6, BackupAction::Delete).await;
    }
    let q = BackupQueue::open(&path).unwrap();
    let ops = q.get_unsynced_operations().await.unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].transaction_id, 5);
    assert_eq!(ops[0].action, BackupAction::Create);
    assert_eq!(ops[1].action, BackupAction::Delete);
    assert!(!q.is_empty().await.unwrap());
}
