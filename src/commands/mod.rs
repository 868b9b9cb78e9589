// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod queue;
pub mod reports;
pub mod transactions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::error::SyncError;
use crate::sync::SyncCoordinator;
use crate::utils::{day_bounds, parse_date};

/// Environment config overlaid with the global command-line options.
pub fn config_from(m: &clap::ArgMatches) -> Result<Config> {
    let mut cfg = Config::from_env()?;
    if let Some(url) = m.get_one::<String>("base-url") {
        cfg = cfg.with_base_url(url.as_str());
    }
    if let Some(token) = m.get_one::<String>("token") {
        cfg = cfg.with_token(token.as_str());
    }
    if let Some(dir) = m.get_one::<String>("data-dir") {
        cfg.data_dir = PathBuf::from(dir);
    }
    Ok(cfg)
}

pub async fn dispatch(coord: &SyncCoordinator, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("account", _)) => accounts::show(coord).await?,
        Some(("categories", sub)) => accounts::categories(coord, sub).await?,
        Some(("tx", sub)) => transactions::handle(coord, sub).await?,
        Some(("history", sub)) => reports::history(coord, sub).await?,
        Some(("pull", sub)) => transactions::pull(coord, sub).await?,
        Some(("pending", sub)) => queue::pending(coord, sub).await?,
        Some(("sync", _)) => queue::sync(coord).await?,
        Some(("export", sub)) => transactions::export(coord, sub).await?,
        Some(("import", sub)) => transactions::import(coord, sub).await?,
        _ => {
            crate::cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

pub(crate) fn required<'a>(sub: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    sub.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", name))
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid {} id '{}'", what, raw))
}

/// `--from`/`--to` as whole-day bounds.
pub(crate) fn period(sub: &clap::ArgMatches) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from = parse_date(required(sub, "from")?)?;
    let to = parse_date(required(sub, "to")?)?;
    anyhow::ensure!(from <= to, "--from {} is after --to {}", from, to);
    Ok(day_bounds(from, to))
}

/// A queued write is not a failure for the shell: the change is on disk.
pub(crate) fn report_write<T>(result: Result<T, SyncError>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_saved_locally() => {
            println!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
