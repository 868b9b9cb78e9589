// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{parse_id, period};
use crate::history::{SortOption, category_breakdown, summarize};
use crate::models::Direction;
use crate::sync::SyncCoordinator;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Result, anyhow};
use rust_decimal::Decimal;

pub async fn history(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let (from, to) = period(sub)?;
    let direction = if sub.get_flag("income") {
        Direction::Income
    } else {
        Direction::Outcome
    };
    let account_id = sub
        .get_one::<String>("account")
        .map(|raw| parse_id(raw, "account"))
        .transpose()?;
    let sort = match sub.get_one::<String>("sort") {
        Some(raw) => raw.parse::<SortOption>().map_err(|e| anyhow!(e))?,
        None => SortOption::default(),
    };

    let details = coord.details_between(from, to).await?;
    let ccy = details
        .first()
        .map(|d| d.account.currency.clone())
        .unwrap_or_else(|| "RUB".to_string());
    let summary = summarize(details, direction, account_id, sort);

    if sub.get_flag("breakdown") {
        let shares = category_breakdown(&summary);
        if maybe_print_json(sub.get_flag("json"), &shares)? {
            return Ok(());
        }
        let rows: Vec<Vec<String>> = shares
            .iter()
            .map(|s| {
                vec![
                    format!("{} {}", s.category.glyph, s.category.name),
                    fmt_money(&s.total, &ccy),
                    format!("{}%", (s.share * Decimal::ONE_HUNDRED).round_dp(1)),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Total", "Share"], rows));
    } else {
        if maybe_print_json(sub.get_flag("json"), &summary)? {
            return Ok(());
        }
        let rows: Vec<Vec<String>> = summary
            .transactions
            .iter()
            .map(|d| {
                vec![
                    d.transaction_date.format("%Y-%m-%d %H:%M").to_string(),
                    format!("{} {}", d.category.glyph, d.category.name),
                    fmt_money(&d.amount, &d.account.currency),
                    d.comment.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Category", "Amount", "Comment"], rows)
        );
    }
    println!("Total: {}", fmt_money(&summary.total, &ccy));
    Ok(())
}
