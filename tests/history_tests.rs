// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{account, categories, dec, tx};
use moneysync::history::{SortOption, category_breakdown, summarize};
use moneysync::resolve::resolve_transactions;
use moneysync::{Direction, TransactionDetails};

fn details() -> Vec<TransactionDetails> {
    let mut salary = tx(1, "5000", 1);
    salary.category_id = 1;
    let mut rent = tx(4, "300", 2);
    rent.category_id = 3;
    let mut other_account = tx(5, "999", 9);
    other_account.account_id = 2;
    let mut second = account(dec("0"));
    second.id = 2;

    resolve_transactions(
        vec![
            salary,
            tx(2, "40.50", 3),
            tx(3, "59.50", 7),
            rent,
            other_account,
        ],
        &[account(dec("0")), second],
        &categories(),
    )
    .unwrap()
}

#[test]
fn outcome_summary_sorted_by_date() {
    let h = summarize(details(), Direction::Outcome, Some(1), SortOption::Date);
    let ids: Vec<i64> = h.transactions.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![3, 2, 4]);
    assert_eq!(h.total, dec("400.00"));
}

#[test]
fn amount_sort_puts_largest_first() {
    let h = summarize(details(), Direction::Outcome, None, SortOption::Amount);
    let ids: Vec<i64> = h.transactions.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2]);
    assert_eq!(h.total, dec("1399.00"));
}

#[test]
fn income_summary_only_sees_income() {
    let h = summarize(details(), Direction::Income, None, SortOption::Date);
    assert_eq!(h.transactions.len(), 1);
    assert_eq!(h.transactions[0].category.name, "Salary");
    assert_eq!(h.total, dec("5000"));
}

#[test]
fn breakdown_shares_sum_to_the_total() {
    let h = summarize(details(), Direction::Outcome, Some(1), SortOption::Date);
    let shares = category_breakdown(&h);
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].category.name, "Rent");
    assert_eq!(shares[0].total, dec("300"));
    assert_eq!(shares[0].share, dec("0.75"));
    assert_eq!(shares[1].category.name, "Groceries");
    assert_eq!(shares[1].total, dec("100.00"));
    assert_eq!(shares[1].share, dec("0.25"));
}
