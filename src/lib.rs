// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod account;
pub mod backup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod exporter;
pub mod history;
pub mod importer;
pub mod locks;
pub mod logging;
pub mod models;
pub mod remote;
pub mod resolve;
pub mod store;
pub mod sync;
pub mod utils;

pub use backup::BackupQueue;
pub use config::Config;
pub use error::{
    QueueError, ReconciliationError, RemoteError, ResolveError, RetryClass, StorageError,
    SyncError,
};
pub use models::{
    Account, BackupAction, BackupOperation, Category, Currency, Direction, Transaction,
    TransactionDetails,
};
pub use remote::{HttpGateway, NetworkClient, RemoteGateway};
pub use store::{JsonFileStore, SqliteStore, TransactionStore};
pub use sync::{ReplayFailure, ReplayReport, SyncCoordinator, SyncEvent, SyncOptions};
