// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::error::ResolveError;
use crate::models::{Account, Category, Transaction, TransactionDetails};

/// Joins transactions with their account and category. Accounts and
/// categories are looked up in maps built once; output order matches input
/// order.
pub fn resolve_transactions(
    transactions: Vec<Transaction>,
    accounts: &[Account],
    categories: &[Category],
) -> Result<Vec<TransactionDetails>, ResolveError> {
    let accounts: HashMap<i64, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
    let categories: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    transactions
        .into_iter()
        .map(|t| {
            let account = accounts
                .get(&t.account_id)
                .ok_or(ResolveError::MissingAccount {
                    transaction_id: t.id,
                    account_id: t.account_id,
                })?;
            let category = categories
                .get(&t.category_id)
                .ok_or(ResolveError::MissingCategory {
                    transaction_id: t.id,
                    category_id: t.category_id,
                })?;
            Ok(TransactionDetails {
                id: t.id,
                account: (*account).clone(),
                category: (*category).clone(),
                amount: t.amount,
                transaction_date: t.transaction_date,
                comment: t.comment,
                created_at: t.created_at,
                updated_at: t.updated_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn account(id: i64) -> Account {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Account {
            id,
            user_id: 1,
            name: format!("Account {}", id),
            balance: Decimal::new(100_000, 2),
            currency: "RUB".into(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn tx(id: i64, account_id: i64, category_id: i64) -> Transaction {
        let ts = Utc.with_ymd_and_hms(2025, 1, id as u32, 12, 0, 0).unwrap();
        Transaction::new_local(id, account_id, category_id, Decimal::ONE, ts, None, ts)
    }

    #[test]
    fn keeps_input_order() {
        let cats = vec![
            Category::new(1, "Food", false, "🍔").unwrap(),
            Category::new(2, "Salary", true, "💰").unwrap(),
        ];
        let out =
            resolve_transactions(vec![tx(3, 1, 2), tx(1, 1, 1), tx(2, 1, 2)], &[account(1)], &cats)
                .unwrap();
        let ids: Vec<i64> = out.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(out[1].category.name, "Food");
        assert_eq!(out[0].account.name, "Account 1");
    }

    #[test]
    fn unknown_category_is_an_error() {
        let err = resolve_transactions(vec![tx(1, 1, 9)], &[account(1)], &[]).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingCategory {
                transaction_id: 1,
                category_id: 9
            }
        );
    }
}
