// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

use crate::models::Currency;

/// Fixed-width RFC 3339 (nanosecond precision, `Z` suffix). Fixed width keeps
/// the text ordering identical to the chronological one.
pub fn fmt_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp '{}', expected RFC 3339", s))
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Start of `from` and end of `to` (inclusive, UTC) for day-granular periods.
pub fn day_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = to
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .unwrap_or_default()
        .and_utc();
    (start, end)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    match ccy.parse::<Currency>() {
        Ok(c) => format!("{} {}", d.round_dp(2), c.symbol()),
        Err(_) => format!("{} {}", d.round_dp(2), ccy),
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

/// Prints `v` as pretty JSON when `json_flag` is set. Returns whether it did.
pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}

/// Case-insensitive subsequence match: every character of `pattern` appears
/// in `text` in order. An empty pattern matches everything.
pub fn fuzzy_matches(text: &str, pattern: &str) -> bool {
    let mut wanted = pattern.chars().flat_map(char::to_lowercase).peekable();
    if wanted.peek().is_none() {
        return true;
    }
    for c in text.chars().flat_map(char::to_lowercase) {
        if wanted.peek() == Some(&c) {
            wanted.next();
            if wanted.peek().is_none() {
                return true;
            }
        }
    }
    false
}
