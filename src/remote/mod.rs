// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The remote side of the sync: a black box that either returns a decoded
//! value or a classified [`RemoteError`].

pub mod client;
pub mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::IgnoredAny;

use crate::error::RemoteError;
use crate::models::{Account, Category, Transaction};

pub use client::NetworkClient;
use wire::{TransactionDetailsResponse, TransactionRequest, TransactionResponse};

#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Creates `tx` remotely and returns the server's copy, which carries the
    /// authoritative id and timestamps.
    async fn create_transaction(&self, tx: &Transaction) -> Result<Transaction, RemoteError>;

    async fn update_transaction(&self, tx: &Transaction) -> Result<Transaction, RemoteError>;

    async fn delete_transaction(&self, id: i64) -> Result<(), RemoteError>;

    /// The user's current account, with the server-computed balance.
    async fn fetch_account(&self) -> Result<Account, RemoteError>;

    async fn fetch_accounts(&self) -> Result<Vec<Account>, RemoteError>;

    async fn fetch_categories(&self) -> Result<Vec<Category>, RemoteError>;

    /// Transactions of `account_id` dated within the given days (inclusive).
    async fn fetch_transactions(
        &self,
        account_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RemoteError>;
}

/// [`RemoteGateway`] over the REST API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: NetworkClient,
}

impl HttpGateway {
    pub fn new(client: NetworkClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn create_transaction(&self, tx: &Transaction) -> Result<Transaction, RemoteError> {
        let body = TransactionRequest::from(tx);
        let resp: TransactionResponse = self
            .client
            .request(Method::POST, "/transactions", Some(&body))
            .await?;
        Ok(resp.into())
    }

    async fn update_transaction(&self, tx: &Transaction) -> Result<Transaction, RemoteError> {
        let body = TransactionRequest::from(tx);
        let resp: TransactionDetailsResponse = self
            .client
            .request(Method::PUT, &format!("/transactions/{}", tx.id), Some(&body))
            .await?;
        Ok(resp.into())
    }

    async fn delete_transaction(&self, id: i64) -> Result<(), RemoteError> {
        let _: IgnoredAny = self
            .client
            .request::<_, ()>(Method::DELETE, &format!("/transactions/{}", id), None)
            .await?;
        Ok(())
    }

    async fn fetch_account(&self) -> Result<Account, RemoteError> {
        self.fetch_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(RemoteError::NotFound)
    }

    async fn fetch_accounts(&self) -> Result<Vec<Account>, RemoteError> {
        self.client.get("/accounts").await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, RemoteError> {
        self.client.get("/categories").await
    }

    async fn fetch_transactions(
        &self,
        account_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RemoteError> {
        let endpoint = format!(
            "/transactions/account/{}/period?startDate={}&endDate={}",
            account_id,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        let resp: Vec<TransactionDetailsResponse> = self.client.get(&endpoint).await?;
        Ok(resp.into_iter().map(Transaction::from).collect())
    }
}
