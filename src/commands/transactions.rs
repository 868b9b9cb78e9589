// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use crate::commands::{parse_id, period, report_write, required};
use crate::exporter::{ExportFormat, export_transactions};
use crate::importer::import_transactions;
use crate::models::Transaction;
use crate::sync::SyncCoordinator;
use crate::utils::{day_bounds, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

pub async fn handle(coord: &SyncCoordinator, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(coord, sub).await?,
        Some(("edit", sub)) => edit(coord, sub).await?,
        Some(("rm", sub)) => remove(coord, sub).await?,
        Some(("list", sub)) => list(coord, sub).await?,
        _ => {}
    }
    Ok(())
}

fn parse_day(raw: &str) -> Result<DateTime<Utc>> {
    let day = parse_date(raw)?;
    Ok(day_bounds(day, day).0)
}

async fn add(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = parse_id(required(sub, "account")?, "account")?;
    let category_id = parse_id(required(sub, "category")?, "category")?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let now = Utc::now();
    let date = match sub.get_one::<String>("date") {
        Some(raw) => parse_day(raw)?,
        None => now,
    };
    let comment = sub.get_one::<String>("comment").cloned();

    let id = coord.next_transaction_id().await?;
    let tx = Transaction::new_local(id, account_id, category_id, amount, date, comment, now);
    if let Some(confirmed) = report_write(coord.create_transaction(tx).await)? {
        println!(
            "Recorded {} on {} (id {})",
            confirmed.amount,
            confirmed.transaction_date.format("%Y-%m-%d"),
            confirmed.id
        );
    }
    Ok(())
}

async fn edit(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(required(sub, "id")?, "transaction")?;
    let mut tx = coord
        .transaction(id)
        .await?
        .with_context(|| format!("Transaction {} not found", id))?;
    if let Some(raw) = sub.get_one::<String>("category") {
        tx.category_id = parse_id(raw, "category")?;
    }
    if let Some(raw) = sub.get_one::<String>("amount") {
        tx.amount = parse_decimal(raw)?;
    }
    if let Some(raw) = sub.get_one::<String>("date") {
        tx.transaction_date = parse_day(raw)?;
    }
    if let Some(comment) = sub.get_one::<String>("comment") {
        tx.comment = Some(comment.clone()).filter(|c| !c.is_empty());
    }
    tx.updated_at = Utc::now();

    if report_write(coord.update_transaction(tx).await)?.is_some() {
        println!("Updated transaction {}", id);
    }
    Ok(())
}

async fn remove(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(required(sub, "id")?, "transaction")?;
    if report_write(coord.delete_transaction(id).await)?.is_some() {
        println!("Removed transaction {}", id);
    }
    Ok(())
}

async fn list(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let data = match (sub.get_one::<String>("from"), sub.get_one::<String>("to")) {
        (None, None) => coord.transactions().await?,
        (from, to) => {
            let from = match from {
                Some(raw) => parse_date(raw)?,
                None => parse_date("0001-01-01")?,
            };
            let to = match to {
                Some(raw) => parse_date(raw)?,
                None => parse_date("9999-12-31")?,
            };
            let (start, end) = day_bounds(from, to);
            coord.transactions_between(start, end).await?
        }
    };
    if maybe_print_json(sub.get_flag("json"), &data)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.transaction_date.format("%Y-%m-%d %H:%M").to_string(),
                t.account_id.to_string(),
                t.category_id.to_string(),
                t.amount.to_string(),
                t.comment.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Date", "Account", "Category", "Amount", "Comment"],
            rows
        )
    );
    Ok(())
}

pub async fn pull(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = parse_id(required(sub, "account")?, "account")?;
    let (from, to) = period(sub)?;
    let written = coord.pull_period(account_id, from, to).await?;
    println!("Pulled {} transaction(s) for account {}", written, account_id);
    Ok(())
}

pub async fn export(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let format: ExportFormat = required(sub, "format")?.parse()?;
    let out = Path::new(required(sub, "out")?);
    let data = coord.transactions().await?;
    export_transactions(&data, format, out)?;
    println!("Exported transactions to {}", out.display());
    Ok(())
}

pub async fn import(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let path = Path::new(required(sub, "path")?);
    let next_id = coord.next_transaction_id().await?;
    let records = import_transactions(path, next_id, Utc::now())?;

    let (mut synced, mut queued) = (0usize, 0usize);
    for tx in records {
        match report_write(coord.create_transaction(tx).await)? {
            Some(_) => synced += 1,
            None => queued += 1,
        }
    }
    println!(
        "Imported transactions from {} ({} synced, {} queued)",
        path.display(),
        synced,
        queued
    );
    Ok(())
}
