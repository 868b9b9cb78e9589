// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Direction;
use crate::sync::SyncCoordinator;
use crate::utils::{fmt_money, fuzzy_matches, pretty_table};
use anyhow::Result;

pub async fn show(coord: &SyncCoordinator) -> Result<()> {
    let account = coord.refresh_account().await?;
    println!(
        "{}",
        pretty_table(
            &["Id", "Name", "Currency", "Balance"],
            vec![vec![
                account.id.to_string(),
                account.name.clone(),
                account.currency.clone(),
                fmt_money(&account.balance, &account.currency),
            ]],
        )
    );
    Ok(())
}

pub async fn categories(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let direction = if sub.get_flag("income") {
        Some(Direction::Income)
    } else if sub.get_flag("outcome") {
        Some(Direction::Outcome)
    } else {
        None
    };
    let pattern = sub.get_one::<String>("search").map(String::as_str).unwrap_or("");

    let data: Vec<Vec<String>> = coord
        .categories(direction)
        .await?
        .into_iter()
        .filter(|c| fuzzy_matches(&c.name, pattern))
        .map(|c| {
            let kind = match c.direction() {
                Direction::Income => "income",
                Direction::Outcome => "outcome",
            };
            vec![c.id.to_string(), c.glyph, c.name, kind.to_string()]
        })
        .collect();
    println!("{}", pretty_table(&["Id", "", "Name", "Kind"], data));
    Ok(())
}
