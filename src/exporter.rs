// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use serde_json::json;

use crate::models::Transaction;
use crate::utils::fmt_timestamp;

/// Column order shared with [`crate::importer`].
pub const CSV_HEADER: [&str; 8] = [
    "id",
    "accountId",
    "categoryId",
    "amount",
    "transactionDate",
    "comment",
    "createdAt",
    "updatedAt",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow!("Unknown format: {} (use csv|json)", other)),
        }
    }
}

/// Writes `transactions` to `out` in their given order. CSV writes a missing
/// comment and an empty one the same way; JSON keeps them apart.
pub fn export_transactions(
    transactions: &[Transaction],
    format: ExportFormat,
    out: &Path,
) -> Result<()> {
    let written = match format {
        ExportFormat::Csv => export_csv(transactions, out),
        ExportFormat::Json => export_json(transactions, out),
    };
    written.with_context(|| format!("Export transactions to {}", out.display()))?;
    tracing::info!(count = transactions.len(), path = %out.display(), "exported transactions");
    Ok(())
}

fn export_csv(transactions: &[Transaction], out: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(out)?;
    wtr.write_record(CSV_HEADER)?;
    for t in transactions {
        wtr.write_record([
            t.id.to_string(),
            t.account_id.to_string(),
            t.category_id.to_string(),
            t.amount.to_string(),
            fmt_timestamp(&t.transaction_date),
            t.comment.clone().unwrap_or_default(),
            fmt_timestamp(&t.created_at),
            fmt_timestamp(&t.updated_at),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn export_json(transactions: &[Transaction], out: &Path) -> Result<()> {
    let items: Vec<_> = transactions
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "accountId": t.account_id,
                "categoryId": t.category_id,
                "amount": t.amount.to_string(),
                "transactionDate": fmt_timestamp(&t.transaction_date),
                "comment": t.comment,
                "createdAt": fmt_timestamp(&t.created_at),
                "updatedAt": fmt_timestamp(&t.updated_at),
            })
        })
        .collect();
    std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
    Ok(())
}
