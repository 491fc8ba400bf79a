// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use serde::Serialize;

use crate::account::Account;
use crate::commands::{account_id, populate_data};
use crate::models::{CategoryKind, Entry, RegularEntry};
use crate::store;
use crate::user::User;
use crate::utils::{
    fmt_money, get_currency, maybe_print_json, parse_amount, parse_date, pretty_table, today,
};

/// Direction of a money movement. Selects the table, the account list and
/// the sign applied to the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Expense,
    Income,
}

impl Flow {
    pub fn kind(self) -> CategoryKind {
        match self {
            Flow::Expense => CategoryKind::Expense,
            Flow::Income => CategoryKind::Income,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Flow::Expense => "expense",
            Flow::Income => "income",
        }
    }

    fn records(self, account: &Account) -> &[Entry] {
        match self {
            Flow::Expense => account.expenses(),
            Flow::Income => account.incomes(),
        }
    }

    fn templates(self, account: &Account) -> &[RegularEntry] {
        match self {
            Flow::Expense => account.regular_expenses(),
            Flow::Income => account.regular_incomes(),
        }
    }
}

pub fn handle(
    conn: &Connection,
    user: &mut User,
    flow: Flow,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, flow, sub)?,
        Some(("list", sub)) => list(user, flow, sub)?,
        Some(("rm", sub)) => remove(conn, user, flow, sub)?,
        Some(("edit", sub)) => edit(conn, user, flow, sub)?,
        _ => {}
    }
    Ok(())
}

/// One insert, one in-memory mutation, one account row update. The three
/// steps are not wrapped in a transaction; the balance change is tried on a
/// copy first so an out-of-range amount is rejected before anything is
/// written.
pub fn commit_entry(
    conn: &Connection,
    user: &mut User,
    flow: Flow,
    account_id: i64,
    mut entry: Entry,
) -> Result<Entry> {
    let account = user
        .account_mut(account_id)
        .with_context(|| format!("Account {} not found", account_id))?;
    let mut staged = account.clone();
    match flow {
        Flow::Expense => staged.add_expense(entry.clone())?,
        Flow::Income => staged.add_income(entry.clone())?,
    }
    entry.id = match flow {
        Flow::Expense => store::insert_expense(conn, account_id, &entry)?,
        Flow::Income => store::insert_income(conn, account_id, &entry)?,
    };
    match flow {
        Flow::Expense => account.add_expense(entry.clone())?,
        Flow::Income => account.add_income(entry.clone())?,
    }
    store::update_account(conn, account)?;
    tracing::info!(id = entry.id, account_id, flow = flow.noun(), "entry committed");
    Ok(entry)
}

/// Stores a recurring template and applies its first occurrence.
pub fn commit_regular(
    conn: &Connection,
    user: &mut User,
    flow: Flow,
    account_id: i64,
    entry: Entry,
    every: u32,
) -> Result<RegularEntry> {
    if every == 0 {
        bail!("Frequency must be at least one day");
    }
    let account = user
        .account_mut(account_id)
        .with_context(|| format!("Account {} not found", account_id))?;
    let mut template = RegularEntry::new(entry, every, account_id);
    let mut staged = account.clone();
    match flow {
        Flow::Expense => staged.add_regular_expense(template.clone())?,
        Flow::Income => staged.add_regular_income(template.clone())?,
    }
    template.entry.id = match flow {
        Flow::Expense => store::insert_regular_expense(conn, &template)?,
        Flow::Income => store::insert_regular_income(conn, &template)?,
    };
    match flow {
        Flow::Expense => account.add_regular_expense(template.clone())?,
        Flow::Income => account.add_regular_income(template.clone())?,
    }
    store::update_account(conn, account)?;
    Ok(template)
}

fn add(conn: &Connection, user: &mut User, flow: Flow, sub: &clap::ArgMatches) -> Result<()> {
    let choices = populate_data(conn, user, flow.kind())?;
    let account_id = choices.account(sub.get_one::<String>("account").unwrap())?;
    let category = match sub.get_one::<String>("category") {
        Some(c) => Some(choices.category(c)?),
        None => None,
    };
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    if name.is_empty() {
        bail!("Name must not be empty");
    }
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let ccy = get_currency(conn)?;
    let entry = Entry::new(name, amount, category, date);

    if let Some(every) = sub.get_one::<u32>("every") {
        let template = commit_regular(conn, user, flow, account_id, entry, *every)?;
        println!(
            "Recorded recurring {} '{}' of {} every {} days (id {})",
            flow.noun(),
            template.entry.name,
            fmt_money(&template.entry.amount, &ccy),
            template.frequency,
            template.entry.id
        );
    } else {
        let entry = commit_entry(conn, user, flow, account_id, entry)?;
        println!(
            "Recorded {} '{}' of {} on {} (id {})",
            flow.noun(),
            entry.name,
            fmt_money(&entry.amount, &ccy),
            entry.date,
            entry.id
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct EntryRow {
    pub id: i64,
    pub account: String,
    pub date: String,
    pub name: String,
    pub category: String,
    pub amount: String,
    pub every: Option<u32>,
}

pub fn rows(user: &User, flow: Flow, account: Option<&str>) -> Vec<EntryRow> {
    let mut data = Vec::new();
    for a in user.accounts() {
        if account.is_some_and(|name| name.trim() != a.name) {
            continue;
        }
        for e in flow.records(a) {
            data.push(EntryRow {
                id: e.id,
                account: a.name.clone(),
                date: e.date.to_string(),
                name: e.name.clone(),
                category: e.category.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
                amount: e.amount.to_string(),
                every: None,
            });
        }
        for r in flow.templates(a) {
            data.push(EntryRow {
                id: r.entry.id,
                account: a.name.clone(),
                date: r.last_occurrence.to_string(),
                name: r.entry.name.clone(),
                category: r
                    .entry
                    .category
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                amount: r.entry.amount.to_string(),
                every: Some(r.frequency),
            });
        }
    }
    data
}

fn list(user: &User, flow: Flow, sub: &clap::ArgMatches) -> Result<()> {
    let data = rows(
        user,
        flow,
        sub.get_one::<String>("account").map(|s| s.as_str()),
    );
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let table_rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.account,
                    r.date,
                    r.name,
                    r.category,
                    r.amount,
                    r.every.map(|d| format!("{} days", d)).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Account", "Date", "Name", "Category", "Amount", "Repeats"],
                table_rows,
            )
        );
    }
    Ok(())
}

/// Deletes a one-off entry and reverts its effect on the balance, or a
/// recurring template (past occurrences stay applied).
pub fn remove_entry(
    conn: &Connection,
    user: &mut User,
    flow: Flow,
    account_id: i64,
    id: i64,
    regular: bool,
) -> Result<()> {
    let account = user
        .account_mut(account_id)
        .with_context(|| format!("Account {} not found", account_id))?;

    if regular {
        if !flow.templates(account).iter().any(|r| r.entry.id == id) {
            bail!("Recurring {} {} not found in '{}'", flow.noun(), id, account.name);
        }
        match flow {
            Flow::Expense => {
                store::remove_regular_expense(conn, id)?;
                account.remove_regular_expense(id);
            }
            Flow::Income => {
                store::remove_regular_income(conn, id)?;
                account.remove_regular_income(id);
            }
        }
        return Ok(());
    }

    if !flow.records(account).iter().any(|e| e.id == id) {
        bail!("{} {} not found in '{}'", flow.noun(), id, account.name);
    }
    match flow {
        Flow::Expense => {
            account.remove_expense(id)?;
            store::remove_expense(conn, id)?;
        }
        Flow::Income => {
            account.remove_income(id)?;
            store::remove_income(conn, id)?;
        }
    }
    store::update_account(conn, account)?;
    Ok(())
}

fn remove(conn: &Connection, user: &mut User, flow: Flow, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = account_id(user, sub.get_one::<String>("account").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let regular = sub.get_flag("regular");
    remove_entry(conn, user, flow, account_id, id, regular)?;
    println!("Removed {} {}", flow.noun(), id);
    Ok(())
}

/// Writes the new version of an entry and moves the balance by the amount
/// difference.
pub fn amend_entry(
    conn: &Connection,
    user: &mut User,
    flow: Flow,
    account_id: i64,
    updated: Entry,
) -> Result<()> {
    let account = user
        .account_mut(account_id)
        .with_context(|| format!("Account {} not found", account_id))?;
    if !flow.records(account).iter().any(|e| e.id == updated.id) {
        bail!("{} {} not found in '{}'", flow.noun(), updated.id, account.name);
    }
    match flow {
        Flow::Expense => {
            account.amend_expense(updated.clone())?;
            store::update_expense(conn, &updated)?;
        }
        Flow::Income => {
            account.amend_income(updated.clone())?;
            store::update_income(conn, &updated)?;
        }
    }
    store::update_account(conn, account)?;
    Ok(())
}

fn edit(conn: &Connection, user: &mut User, flow: Flow, sub: &clap::ArgMatches) -> Result<()> {
    let choices = populate_data(conn, user, flow.kind())?;
    let account_id = choices.account(sub.get_one::<String>("account").unwrap())?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = user
        .account(account_id)
        .and_then(|a| flow.records(a).iter().find(|e| e.id == id))
        .cloned()
        .with_context(|| format!("{} {} not found", flow.noun(), id))?;

    let mut updated = current;
    if let Some(name) = sub.get_one::<String>("name") {
        let name = name.trim();
        if name.is_empty() {
            bail!("Name must not be empty");
        }
        updated.name = name.to_string();
    }
    if let Some(amount) = sub.get_one::<String>("amount") {
        updated.amount = parse_amount(amount)?;
    }
    if let Some(category) = sub.get_one::<String>("category") {
        updated.category = Some(choices.category(category)?);
    }
    if let Some(date) = sub.get_one::<String>("date") {
        updated.date = parse_date(date)?;
    }
    amend_entry(conn, user, flow, account_id, updated)?;
    println!("Updated {} {}", flow.noun(), id);
    Ok(())
}
