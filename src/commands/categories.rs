// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CategoryKind;
use crate::store;
use crate::utils::pretty_table;
use anyhow::{Context, Result};
use rusqlite::Connection;

fn kind_of(sub: &clap::ArgMatches) -> Result<CategoryKind> {
    let raw = sub.get_one::<String>("kind").unwrap();
    CategoryKind::parse(raw).with_context(|| format!("Unknown category kind '{}'", raw))
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind = kind_of(sub)?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            let id = store::insert_category(conn, kind, name)?;
            println!("Added category '{}' (id {})", name, id);
        }
        Some(("list", sub)) => {
            let kind = kind_of(sub)?;
            let data = store::categories(conn, kind)?
                .into_iter()
                .map(|c| vec![c.id.to_string(), c.name])
                .collect();
            println!("{}", pretty_table(&["ID", "Category"], data));
        }
        Some(("rm", sub)) => {
            let kind = kind_of(sub)?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            let category = store::category_by_name(conn, kind, name)?
                .with_context(|| format!("Category '{}' not found", name))?;
            store::remove_category(conn, kind, category.id)?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
