// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use moneysync::{SyncCoordinator, cli, commands, logging};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("moneysync=warn");
    let matches = cli::build_cli().get_matches();

    let cfg = commands::config_from(&matches)?;
    let coord = SyncCoordinator::open(&cfg)?;
    commands::dispatch(&coord, &matches).await
}
