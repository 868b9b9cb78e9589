// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Period summaries over resolved transactions.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Category, Direction, TransactionDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Newest first.
    #[default]
    Date,
    /// Largest first.
    Amount,
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortOption::Date),
            "amount" => Ok(SortOption::Amount),
            other => Err(format!("Unknown sort option '{}' (use date|amount)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct History {
    pub transactions: Vec<TransactionDetails>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub total: Decimal,
    /// Fraction of the summary total in `[0, 1]`, rounded to four places.
    pub share: Decimal,
}

pub fn summarize(
    details: Vec<TransactionDetails>,
    direction: Direction,
    account_id: Option<i64>,
    sort: SortOption,
) -> History {
    let mut transactions: Vec<TransactionDetails> = details
        .into_iter()
        .filter(|d| d.direction() == direction)
        .filter(|d| account_id.is_none_or(|id| d.account.id == id))
        .collect();

    match sort {
        SortOption::Date => transactions.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.id.cmp(&a.id))
        }),
        SortOption::Amount => {
            transactions.sort_by(|a, b| b.amount.cmp(&a.amount).then(b.id.cmp(&a.id)))
        }
    }

    let total = transactions.iter().map(|d| d.amount).sum();
    History {
        transactions,
        total,
    }
}

/// Groups a summary by category, largest total first. Ties keep the
/// alphabetical order of category names.
pub fn category_breakdown(history: &History) -> Vec<CategoryShare> {
    let mut by_id: HashMap<i64, (Category, Decimal)> = HashMap::new();
    for d in &history.transactions {
        by_id
            .entry(d.category.id)
            .or_insert_with(|| (d.category.clone(), Decimal::ZERO))
            .1 += d.amount;
    }

    let mut out: Vec<CategoryShare> = by_id
        .into_values()
        .map(|(category, total)| {
            let share = if history.total.is_zero() {
                Decimal::ZERO
            } else {
                (total / history.total).round_dp(4)
            };
            CategoryShare {
                category,
                total,
                share,
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.name.cmp(&b.category.name))
    });
    out
}
