// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod categories;
pub mod config;
pub mod entries;
pub mod regular;
pub mod status;
pub mod users;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::models::{Category, CategoryKind};
use crate::store;
use crate::user::User;

/// Opens a session from the global `--user`/`--password` options.
pub fn login(conn: &Connection, m: &clap::ArgMatches) -> Result<User> {
    let name = m
        .get_one::<String>("user")
        .context("--user (or HOMELEDGER_USER) is required")?;
    let password = m
        .get_one::<String>("password")
        .context("--password (or HOMELEDGER_PASSWORD) is required")?;
    store::login(conn, name.trim(), password)?
        .with_context(|| format!("Login failed for '{}'", name.trim()))
}

pub fn account_id(user: &User, name: &str) -> Result<i64> {
    user.account_by_name(name.trim())
        .map(|a| a.id)
        .with_context(|| format!("Account '{}' not found", name.trim()))
}

/// What an entry form can pick from: the categories of one kind and the
/// session's accounts.
#[derive(Debug, Clone)]
pub struct Choices {
    pub categories: Vec<Category>,
    pub accounts: Vec<(i64, String)>,
}

impl Choices {
    pub fn account(&self, name: &str) -> Result<i64> {
        let name = name.trim();
        self.accounts
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| *id)
            .with_context(|| format!("Account '{}' not found", name))
    }

    pub fn category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        self.categories
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .with_context(|| format!("Category '{}' not found", name))
    }
}

pub fn populate_data(conn: &Connection, user: &User, kind: CategoryKind) -> Result<Choices> {
    Ok(Choices {
        categories: store::categories(conn, kind)?,
        accounts: user
            .accounts()
            .iter()
            .map(|a| (a.id, a.name.clone()))
            .collect(),
    })
}
