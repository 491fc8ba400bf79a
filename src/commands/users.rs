// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::commands::login;
use crate::store;
use crate::utils::{fmt_money, get_currency, parse_decimal, pretty_table};

/// `root` holds the global `--user`/`--password` options.
pub fn handle(conn: &Connection, root: &clap::ArgMatches, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("register", sub)) => {
            let name = root
                .get_one::<String>("user")
                .context("--user is required to register")?;
            let password = root
                .get_one::<String>("password")
                .context("--password is required to register")?;
            let budget = parse_decimal(sub.get_one::<String>("budget").unwrap())?;
            let id = store::insert_user(conn, name, password, budget)
                .with_context(|| format!("Could not register '{}'", name.trim()))?;
            println!("Registered user '{}' (id {})", name.trim(), id);
        }
        Some(("show", _)) => {
            let user = login(conn, root)?;
            let ccy = get_currency(conn)?;
            let rows = vec![vec![
                user.name.clone(),
                fmt_money(&user.monthly_budget, &ccy),
                user.accounts().len().to_string(),
                fmt_money(&user.total_balance()?, &ccy),
            ]];
            println!(
                "{}",
                pretty_table(&["User", "Monthly budget", "Accounts", "Total"], rows)
            );
            user.logout();
        }
        Some(("budget", sub)) => {
            let mut user = login(conn, root)?;
            user.monthly_budget = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            store::update_user(conn, &user)?;
            println!(
                "Monthly budget set to {}",
                fmt_money(&user.monthly_budget, &get_currency(conn)?)
            );
            user.logout();
        }
        _ => {}
    }
    Ok(())
}
