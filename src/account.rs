// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use tokio::sync::watch;

use crate::models::Account;

/// Latest account snapshot confirmed by the server. The balance is never
/// computed locally; it is replaced wholesale on every refresh.
pub struct AccountState {
    tx: watch::Sender<Option<Account>>,
}

impl Default for AccountState {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<Account> {
        self.tx.borrow().clone()
    }

    pub fn replace(&self, account: Account) {
        self.tx.send_replace(Some(account));
    }

    /// Receiver that sees every later refresh; starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<Account>> {
        self.tx.subscribe()
    }
}
