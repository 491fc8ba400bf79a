// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

use homeledger::commands::{self, entries::Flow};
use homeledger::{cli, db, utils};

fn main() -> Result<()> {
    utils::init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let db_override = matches.get_one::<PathBuf>("db").cloned();
    let conn = db::open_or_init(db_override.as_deref())?;

    match matches.subcommand() {
        Some(("init", _)) => {
            let path = match db_override {
                Some(p) => p,
                None => db::db_path()?,
            };
            println!("Database initialized at {}", path.display());
        }
        Some(("user", sub)) => commands::users::handle(&conn, &matches, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some((name, sub)) => {
            let mut user = commands::login(&conn, &matches)?;
            match name {
                "account" => commands::accounts::handle(&conn, &mut user, sub)?,
                "expense" => commands::entries::handle(&conn, &mut user, Flow::Expense, sub)?,
                "income" => commands::entries::handle(&conn, &mut user, Flow::Income, sub)?,
                "regular" => commands::regular::handle(&conn, &mut user, sub)?,
                "status" => commands::status::handle(&conn, &user, sub)?,
                _ => {}
            }
            user.logout();
        }
        None => {
            cli::build_cli().print_help()?;
            println!();
        }
    }

    db::close(conn)?;
    Ok(())
}
