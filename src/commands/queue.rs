// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::RetryClass;
use crate::sync::SyncCoordinator;
use crate::utils::{fmt_timestamp, maybe_print_json, pretty_table};
use anyhow::Result;

pub async fn pending(coord: &SyncCoordinator, sub: &clap::ArgMatches) -> Result<()> {
    let ops = coord.pending_operations().await?;
    if maybe_print_json(sub.get_flag("json"), &ops)? {
        return Ok(());
    }
    if ops.is_empty() {
        println!("Nothing to sync");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = ops
        .iter()
        .map(|op| {
            vec![
                op.transaction_id.to_string(),
                op.action.to_string(),
                fmt_timestamp(&op.timestamp),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Transaction", "Action", "Since"], rows));
    Ok(())
}

pub async fn sync(coord: &SyncCoordinator) -> Result<()> {
    let report = coord.sync_backups().await?;
    println!(
        "Synced {} operation(s), {} still pending",
        report.synced.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        let hint = match failure.retry_class() {
            RetryClass::Retryable => "will retry",
            RetryClass::ReauthRequired => "check the token",
            RetryClass::Permanent => "needs attention",
        };
        println!(
            "  {} #{}: {} ({})",
            failure.operation.action, failure.operation.transaction_id, failure.error, hint
        );
    }
    Ok(())
}
