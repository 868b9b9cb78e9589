// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{ArgAction, Command, arg, command};

pub fn build_cli() -> Command {
    command!()
        .name("moneysync")
        .about("Offline-first transaction sync for the finance API")
        .arg(arg!(--"base-url" <URL> "API base URL").global(true))
        .arg(arg!(--token <TOKEN> "Bearer token").global(true))
        .arg(arg!(--"data-dir" <DIR> "Directory holding the local store").global(true))
        .subcommand_required(false)
        .subcommand(
            Command::new("account").about("Fetch the account and show its balance"),
        )
        .subcommand(
            Command::new("categories")
                .about("List categories")
                .arg(arg!(--income "Only income categories").action(ArgAction::SetTrue))
                .arg(
                    arg!(--outcome "Only outcome categories")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("income"),
                )
                .arg(arg!(--search <PATTERN> "Fuzzy filter on the name")),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--account <ID>).required(true))
                        .arg(arg!(--category <ID>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--date <DATE> "YYYY-MM-DD, defaults to today"))
                        .arg(arg!(--comment <TEXT>)),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--category <ID>))
                        .arg(arg!(--amount <AMOUNT>))
                        .arg(arg!(--date <DATE>))
                        .arg(arg!(--comment <TEXT>)),
                )
                .subcommand(Command::new("rm").arg(arg!(--id <ID>).required(true)))
                .subcommand(
                    Command::new("list")
                        .arg(arg!(--from <DATE> "YYYY-MM-DD"))
                        .arg(arg!(--to <DATE> "YYYY-MM-DD"))
                        .arg(arg!(--json "Output JSON").action(ArgAction::SetTrue)),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Income or outcome summary for a period")
                .arg(arg!(--from <DATE>).required(true))
                .arg(arg!(--to <DATE>).required(true))
                .arg(arg!(--income "Income instead of outcome").action(ArgAction::SetTrue))
                .arg(arg!(--account <ID>))
                .arg(
                    arg!(--sort <BY> "date|amount")
                        .value_parser(["date", "amount"])
                        .default_value("date"),
                )
                .arg(arg!(--breakdown "Group by category").action(ArgAction::SetTrue))
                .arg(arg!(--json "Output JSON").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("pull")
                .about("Fetch a period from the server into the local store")
                .arg(arg!(--account <ID>).required(true))
                .arg(arg!(--from <DATE>).required(true))
                .arg(arg!(--to <DATE>).required(true)),
        )
        .subcommand(
            Command::new("pending")
                .about("Show operations waiting to be synced")
                .arg(arg!(--json "Output JSON").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("sync").about("Replay queued operations"))
        .subcommand(
            Command::new("export")
                .about("Export local transactions")
                .arg(
                    arg!(--format <FMT> "csv|json")
                        .value_parser(["csv", "json"])
                        .default_value("csv"),
                )
                .arg(arg!(--out <PATH>).required(true)),
        )
        .subcommand(
            Command::new("import")
                .about("Import transactions from CSV and sync them")
                .arg(arg!(--path <PATH>).required(true)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_options_reach_subcommands() {
        let m = build_cli()
            .try_get_matches_from(["moneysync", "sync", "--token", "abc"])
            .unwrap();
        let sub = m.subcommand_matches("sync").unwrap();
        assert_eq!(sub.get_one::<String>("token").map(String::as_str), Some("abc"));
    }
}
