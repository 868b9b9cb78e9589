// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Request and response bodies of the finance API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub comment: Option<String>,
}

impl From<&Transaction> for TransactionRequest {
    fn from(tx: &Transaction) -> Self {
        Self {
            account_id: tx.account_id,
            category_id: tx.category_id,
            amount: tx.amount,
            transaction_date: tx.transaction_date,
            comment: tx.comment.clone(),
        }
    }
}

/// Body returned by `POST /transactions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i64,
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionResponse> for Transaction {
    fn from(r: TransactionResponse) -> Self {
        Transaction {
            id: r.id,
            account_id: r.account_id,
            category_id: r.category_id,
            amount: r.amount,
            transaction_date: r.transaction_date,
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

/// Body returned by `PUT /transactions/{id}` and the list endpoints, where
/// account and category are embedded objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetailsResponse {
    pub id: i64,
    pub account: IdRef,
    pub category: IdRef,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionDetailsResponse> for Transaction {
    fn from(r: TransactionDetailsResponse) -> Self {
        Transaction {
            id: r.id,
            account_id: r.account.id,
            category_id: r.category.id,
            amount: r.amount,
            transaction_date: r.transaction_date,
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_sends_amount_as_string() {
        let tx = Transaction::new_local(
            5,
            1,
            2,
            Decimal::new(1250, 2),
            "2025-06-12T13:56:09Z".parse().unwrap(),
            None,
            "2025-06-12T14:00:00Z".parse().unwrap(),
        );
        let body = serde_json::to_value(TransactionRequest::from(&tx)).unwrap();
        assert_eq!(body["amount"], "12.50");
        assert_eq!(body["accountId"], 1);
        assert_eq!(body["categoryId"], 2);
        assert!(body["comment"].is_null());
    }

    #[test]
    fn nested_response_flattens_to_ids() {
        let raw = r#"{
            "id": 42,
            "account": {"id": 1, "name": "Main", "balance": "100.00", "currency": "RUB"},
            "category": {"id": 3, "name": "Food", "emoji": "🍔", "isIncome": false},
            "amount": "-12.50",
            "transactionDate": "2025-06-12T13:56:09.000Z",
            "comment": null,
            "createdAt": "2025-06-12T13:56:09Z",
            "updatedAt": "2025-06-12T13:56:09Z"
        }"#;
        let r: TransactionDetailsResponse = serde_json::from_str(raw).unwrap();
        let tx = Transaction::from(r);
        assert_eq!(tx.id, 42);
        assert_eq!(tx.account_id, 1);
        assert_eq!(tx.category_id, 3);
        assert_eq!(tx.amount.to_string(), "-12.50");
    }
}
