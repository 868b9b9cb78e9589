// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy for the store, the backup queue, the remote gateway and the
//! coordinator that ties them together.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::BackupAction;

/// Errors raised by a local transaction store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("transaction {0} already exists")]
    DuplicateKey(i64),

    #[error("transaction {0} not found")]
    NotFound(i64),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file exists but does not hold a valid transaction array.
    #[error("malformed store file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid stored value: {0}")]
    InvalidData(String),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the backup queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("no pending backup operation for transaction {0}")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid queued value: {0}")]
    InvalidData(String),

    #[error("queue task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// How a failed remote call should be treated by replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Classified failures of the remote gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid server response")]
    InvalidResponse,

    #[error("HTTP error {status}: {}", .message.as_deref().unwrap_or("No message"))]
    Http { status: u16, message: Option<String> },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Resource not found")]
    NotFound,

    #[error("Bad request")]
    BadRequest,

    #[error("Conflict error")]
    Conflict,

    #[error("Server error")]
    ServerError,

    /// 204 where a body was expected.
    #[error("Empty response")]
    EmptyResponse,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Maps a non-success HTTP status to its error variant.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            409 => Self::Conflict,
            500 => Self::ServerError,
            _ => Self::Http { status, message },
        }
    }

    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Unauthorized => RetryClass::ReauthRequired,
            Self::Transport(_) | Self::Timeout(_) | Self::Conflict | Self::ServerError => {
                RetryClass::Retryable
            }
            Self::Http { status, .. } => match *status {
                403 => RetryClass::ReauthRequired,
                408 | 423 | 425 | 429 | 500..=599 => RetryClass::Retryable,
                _ => RetryClass::Permanent,
            },
            Self::InvalidUrl(_)
            | Self::InvalidResponse
            | Self::Serialization(_)
            | Self::NotFound
            | Self::BadRequest
            | Self::EmptyResponse => RetryClass::Permanent,
        }
    }
}

/// Refreshing derived state after a successful remote write failed.
/// Never fatal: callers log it and move on.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("account refresh failed: {0}")]
    AccountRefresh(#[source] RemoteError),

    #[error("local reconciliation of transaction {id} failed: {source}")]
    Store {
        id: i64,
        #[source]
        source: StorageError,
    },
}

/// Joining transactions with accounts and categories failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("transaction {transaction_id} references unknown account {account_id}")]
    MissingAccount { transaction_id: i64, account_id: i64 },

    #[error("transaction {transaction_id} references unknown category {category_id}")]
    MissingCategory {
        transaction_id: i64,
        category_id: i64,
    },
}

/// Errors surfaced by the sync coordinator.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local write failed; nothing was queued.
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The local write succeeded but the remote call did not. The operation
    /// is queued for replay.
    #[error("transaction {id} saved locally, {action} not yet synced: {source}")]
    Queued {
        id: i64,
        action: BackupAction,
        #[source]
        source: RemoteError,
    },

    /// A read from the remote gateway failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The background remote phase did not run to completion.
    #[error("sync task interrupted: {0}")]
    Interrupted(String),
}

impl SyncError {
    /// True when the user's change is durable locally and only the remote
    /// step is outstanding.
    pub fn is_saved_locally(&self) -> bool {
        matches!(self, SyncError::Queued { .. })
    }
}
