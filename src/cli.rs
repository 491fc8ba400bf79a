// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn today_arg() -> Arg {
    Arg::new("today")
        .long("today")
        .help("Evaluate as of this date (YYYY-MM-DD), default: today")
}

fn kind_arg() -> Arg {
    Arg::new("kind")
        .long("kind")
        .value_parser(["expense", "income"])
        .default_value("expense")
}

/// `expense` and `income` share one shape.
fn entry_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record a one-off entry, or a recurring one with --every")
                .arg(Arg::new("account").long("account").required(true))
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("category").long("category"))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("YYYY-MM-DD, default: today"),
                )
                .arg(
                    Arg::new("every")
                        .long("every")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Repeat every N days"),
                ),
        )
        .subcommand(
            Command::new("list")
                .arg(Arg::new("account").long("account"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("rm")
                .arg(Arg::new("account").long("account").required(true))
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(
                    Arg::new("regular")
                        .long("regular")
                        .action(ArgAction::SetTrue)
                        .help("Remove a recurring template instead"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .arg(Arg::new("account").long("account").required(true))
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("date").long("date")),
        )
}

pub fn build_cli() -> Command {
    Command::new("homeledger")
        .version(clap::crate_version!())
        .about("Personal finance ledger: accounts, expenses, incomes and savings")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("HOMELEDGER_DB")
                .value_parser(value_parser!(PathBuf))
                .help("Database file, default: platform data dir"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("HOMELEDGER_USER"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .global(true)
                .env("HOMELEDGER_PASSWORD")
                .hide_env_values(true),
        )
        .subcommand(Command::new("init").about("Create the database if needed"))
        .subcommand(
            Command::new("user")
                .about("Register and manage the ledger owner")
                .subcommand_required(true)
                .subcommand(
                    Command::new("register")
                        .about("Create a user from --user/--password")
                        .arg(Arg::new("budget").long("budget").default_value("0")),
                )
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("budget")
                        .about("Set the monthly budget")
                        .arg(Arg::new("amount").required(true)),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("balance").long("balance").default_value("0"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["plain", "credit", "saving"])
                                .default_value("plain"),
                        )
                        .arg(
                            Arg::new("interest")
                                .long("interest")
                                .default_value("0")
                                .help("Yearly interest rate in percent"),
                        )
                        .arg(
                            Arg::new("period")
                                .long("period")
                                .value_parser(value_parser!(u32).range(1..))
                                .default_value("30")
                                .help("Capitalization period in days (saving)"),
                        )
                        .arg(
                            Arg::new("since")
                                .long("since")
                                .help("Last capitalization date (saving), default: today"),
                        ),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(
                    Command::new("rename")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                )
                .subcommand(
                    Command::new("transfer")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(
                    Command::new("capitalize")
                        .about("Apply due interest on saving accounts")
                        .arg(today_arg()),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage expense and income categories")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(kind_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list").arg(kind_arg()))
                .subcommand(
                    Command::new("rm")
                        .arg(kind_arg())
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(entry_command("expense", "Record and manage expenses"))
        .subcommand(entry_command("income", "Record and manage incomes"))
        .subcommand(
            Command::new("regular")
                .about("Recurring expenses and incomes")
                .subcommand_required(true)
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(
                    Command::new("run")
                        .about("Apply every occurrence that is due")
                        .arg(today_arg()),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Balances and monthly budget usage")
                .arg(Arg::new("month").long("month").help("YYYY-MM, default: current")),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand_required(true)
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set-currency").arg(Arg::new("currency").required(true)),
                ),
        )
}
