// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per transaction id. Operations on different ids never
/// wait on each other; operations on the same id run one at a time.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    slots: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

/// Held for the duration of one operation on `id`. Dropping it releases the
/// id and forgets the slot when nobody else is waiting for it.
pub struct IdGuard {
    slots: Arc<DashMap<i64, Arc<Mutex<()>>>>,
    id: i64,
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: i64) -> IdGuard {
        let slot = self.slots.entry(id).or_default().clone();
        let guard = slot.lock_owned().await;
        IdGuard {
            slots: Arc::clone(&self.slots),
            id,
            _guard: guard,
        }
    }

    /// Number of ids currently tracked.
    pub fn tracked(&self) -> usize {
        self.slots.len()
    }
}

impl IdGuard {
    pub fn id(&self) -> i64 {
        self.id
    }
}

impl Drop for IdGuard {
    fn drop(&mut self) {
        // map + this guard's own handle
        self.slots
            .remove_if(&self.id, |_, slot| Arc::strong_count(slot) <= 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_id_is_serialized() {
        let locks = KeyedLocks::new();
        let first = locks.lock(7).await;

        let l2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l2.lock(7).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn different_ids_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(2)).await;
        assert!(b.is_ok());
        assert_eq!(locks.tracked(), 2);
    }
}
