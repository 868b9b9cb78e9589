// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;

use crate::models::Transaction;
use crate::utils::{day_bounds, parse_date, parse_decimal, parse_timestamp};

/// Reads a CSV in the export layout (see [`crate::exporter::CSV_HEADER`]).
///
/// Rows with an empty `id` get provisional ids counting up from `next_id`.
/// `transactionDate` is RFC 3339 or a bare `YYYY-MM-DD` (start of day, UTC).
/// Missing `createdAt`/`updatedAt` default to `now`. An empty `comment` cell
/// reads as no comment, so an empty comment does not survive a CSV round trip.
pub fn import_transactions(
    path: &Path,
    next_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Transaction>> {
    let file = std::fs::File::open(path).with_context(|| format!("Open CSV {}", path.display()))?;
    let out = read_transactions(file, next_id, now)?;
    tracing::info!(count = out.len(), path = %path.display(), "imported transactions");
    Ok(out)
}

pub fn read_transactions<R: Read>(
    reader: R,
    mut next_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let rec = result.with_context(|| format!("Malformed CSV at line {}", line))?;
        let field = |i: usize| rec.get(i).map(str::trim).unwrap_or("");

        let id = match field(0) {
            "" => {
                let id = next_id;
                next_id += 1;
                id
            }
            raw => raw
                .parse::<i64>()
                .with_context(|| format!("Invalid id '{}' at line {}", raw, line))?,
        };
        if !seen.insert(id) {
            return Err(anyhow!("Duplicate id {} at line {}", id, line));
        }

        let account_id = parse_id(field(1), "accountId", line)?;
        let category_id = parse_id(field(2), "categoryId", line)?;
        let amount = parse_decimal(field(3)).with_context(|| format!("line {}", line))?;
        let transaction_date =
            parse_when(field(4)).with_context(|| format!("line {}", line))?;
        let comment = Some(field(5))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let created_at = parse_optional_ts(field(6), now, line)?;
        let updated_at = parse_optional_ts(field(7), now, line)?;

        out.push(Transaction {
            id,
            account_id,
            category_id,
            amount,
            transaction_date,
            comment,
            created_at,
            updated_at,
        });
    }
    Ok(out)
}

fn parse_id(raw: &str, column: &str, line: usize) -> Result<i64> {
    if raw.is_empty() {
        return Err(anyhow!("{} missing at line {}", column, line));
    }
    raw.parse::<i64>()
        .with_context(|| format!("Invalid {} '{}' at line {}", column, raw, line))
}

fn parse_when(raw: &str) -> Result<DateTime<Utc>> {
    if raw.len() == 10 {
        let day = parse_date(raw)?;
        return Ok(day_bounds(day, day).0);
    }
    parse_timestamp(raw)
}

fn parse_optional_ts(raw: &str, now: DateTime<Utc>, line: usize) -> Result<DateTime<Utc>> {
    if raw.is_empty() {
        return Ok(now);
    }
    parse_timestamp(raw).with_context(|| format!("line {}", line))
}
