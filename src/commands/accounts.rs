// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::account::{Account, AccountKind};
use crate::commands::account_id;
use crate::store;
use crate::user::User;
use crate::utils::{
    fmt_money, get_currency, maybe_print_json, parse_amount, parse_date, parse_decimal,
    pretty_table, today,
};

pub fn handle(conn: &Connection, user: &mut User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("rm", sub)) => remove(conn, user, sub)?,
        Some(("rename", sub)) => rename(conn, user, sub)?,
        Some(("transfer", sub)) => transfer(conn, user, sub)?,
        Some(("capitalize", sub)) => capitalize(conn, user, sub)?,
        _ => {}
    }
    Ok(())
}

/// Inserts the account row and appends the account to the session.
pub fn open_account(conn: &Connection, user: &mut User, mut account: Account) -> Result<i64> {
    if user.account_by_name(&account.name).is_some() {
        bail!("Account '{}' already exists", account.name);
    }
    account.id = store::insert_account(conn, user.id, &account)?;
    let id = account.id;
    user.add_account(account);
    Ok(id)
}

fn add(conn: &Connection, user: &mut User, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    if name.is_empty() {
        bail!("Account name must not be empty");
    }
    let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
    let rate = parse_decimal(sub.get_one::<String>("interest").unwrap())?;
    let kind = match sub.get_one::<String>("type").unwrap().as_str() {
        "credit" => AccountKind::credit(rate)?,
        "saving" => {
            let since = match sub.get_one::<String>("since") {
                Some(d) => parse_date(d)?,
                None => today(),
            };
            let period = *sub.get_one::<u32>("period").unwrap();
            AccountKind::saving(rate, since, period)?
        }
        _ => AccountKind::Plain,
    };
    let label = kind.label();
    let id = open_account(conn, user, Account::new(name.clone(), balance, kind))?;
    println!(
        "Added {} account '{}' with balance {} (id {})",
        label,
        name,
        fmt_money(&balance, &get_currency(conn)?),
        id
    );
    Ok(())
}

fn list(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), &user.accounts())? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let data = user
        .accounts()
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.kind.label().to_string(),
                fmt_money(&a.balance(), &ccy),
                a.kind
                    .interest_rate()
                    .map(|r| format!("{}%", r))
                    .unwrap_or_default(),
                a.expenses().len().to_string(),
                a.incomes().len().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Name", "Type", "Balance", "Interest", "Expenses", "Incomes"],
            data
        )
    );
    Ok(())
}

fn remove(conn: &Connection, user: &mut User, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let id = account_id(user, name)?;
    let account = user.account(id).cloned().context("Account vanished")?;
    store::delete_account(conn, id)?;
    user.delete_account(&account);
    println!("Removed account '{}'", account.name);
    Ok(())
}

fn rename(conn: &Connection, user: &mut User, sub: &clap::ArgMatches) -> Result<()> {
    let from = sub.get_one::<String>("name").unwrap().trim().to_string();
    let to = sub.get_one::<String>("to").unwrap().trim().to_string();
    if to.is_empty() {
        bail!("Account name must not be empty");
    }
    let id = account_id(user, &from)?;
    if from == to {
        println!("Account '{}' already has that name", from);
        return Ok(());
    }
    if user.account_by_name(&to).is_some() {
        bail!("Account '{}' already exists", to);
    }
    if let Some(account) = user.account_mut(id) {
        account.name = to.clone();
        store::update_account(conn, account)?;
    }
    println!("Renamed account '{}' to '{}'", from, to);
    Ok(())
}

/// Moves money in memory, then writes the target row and the source row as
/// two separate updates.
pub fn transfer_between(
    conn: &Connection,
    user: &mut User,
    from_id: i64,
    to_id: i64,
    amount: Decimal,
) -> Result<()> {
    user.transfer(from_id, to_id, amount)?;
    for id in [to_id, from_id] {
        let account = user.account(id).context("Account vanished")?;
        store::update_account(conn, account)?;
    }
    tracing::info!(from_id, to_id, %amount, "transfer committed");
    Ok(())
}

fn transfer(conn: &Connection, user: &mut User, sub: &clap::ArgMatches) -> Result<()> {
    let from = account_id(user, sub.get_one::<String>("from").unwrap())?;
    let to = account_id(user, sub.get_one::<String>("to").unwrap())?;
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    transfer_between(conn, user, from, to, amount)?;
    println!(
        "Transferred {} from '{}' to '{}'",
        fmt_money(&amount, &get_currency(conn)?),
        sub.get_one::<String>("from").unwrap().trim(),
        sub.get_one::<String>("to").unwrap().trim()
    );
    Ok(())
}

/// Applies due interest to every saving account and persists the ones whose
/// capitalization date moved. Returns `(account name, interest)` per account
/// that was capitalized.
pub fn capitalize_all(
    conn: &Connection,
    user: &mut User,
    as_of: NaiveDate,
) -> Result<Vec<(String, Decimal)>> {
    let mut applied = Vec::new();
    for account in user.accounts_mut() {
        let before = account.kind;
        let interest = account.capitalize(as_of)?;
        if account.kind != before {
            store::update_account(conn, account)?;
            applied.push((account.name.clone(), interest));
        }
    }
    Ok(applied)
}

fn capitalize(conn: &Connection, user: &mut User, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = match sub.get_one::<String>("today") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let applied = capitalize_all(conn, user, as_of)?;
    if applied.is_empty() {
        println!("No saving account is due for capitalization");
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let rows = applied
        .into_iter()
        .map(|(name, interest)| vec![name, fmt_money(&interest, &ccy)])
        .collect();
    println!("{}", pretty_table(&["Account", "Interest"], rows));
    Ok(())
}
