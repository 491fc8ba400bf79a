// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::store;
use crate::user::User;
use crate::utils::{fmt_money, get_currency, maybe_print_json, parse_date, pretty_table, today};

pub fn handle(conn: &Connection, user: &mut User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("run", sub)) => run(conn, user, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct TemplateRow {
    id: i64,
    account: String,
    kind: &'static str,
    name: String,
    amount: String,
    every: u32,
    last: String,
    next: String,
}

fn list(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let mut data = Vec::new();
    for a in user.accounts() {
        let tagged = a
            .regular_expenses()
            .iter()
            .map(|r| ("expense", r))
            .chain(a.regular_incomes().iter().map(|r| ("income", r)));
        for (kind, r) in tagged {
            data.push(TemplateRow {
                id: r.entry.id,
                account: a.name.clone(),
                kind,
                name: r.entry.name.clone(),
                amount: r.entry.amount.to_string(),
                every: r.frequency,
                last: r.last_occurrence.to_string(),
                next: r.next_due().map(|d| d.to_string()).unwrap_or_default(),
            });
        }
    }
    if maybe_print_json(sub.get_flag("json"), &data)? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let rows = data
        .into_iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.account,
                r.kind.to_string(),
                r.name,
                format!("{} {}", ccy, r.amount),
                format!("{} days", r.every),
                r.last,
                r.next,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Account", "Kind", "Name", "Amount", "Every", "Last", "Next"],
            rows
        )
    );
    Ok(())
}

/// What `run_due` applied to one account.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub account: String,
    pub expenses: usize,
    pub incomes: usize,
}

/// Fires every recurring occurrence due on or before `as_of`: each one is
/// stored as a one-off entry dated at its occurrence, applied to the balance,
/// and the template's last-occurrence date is moved forward.
pub fn run_due(conn: &Connection, user: &mut User, as_of: NaiveDate) -> Result<Vec<Applied>> {
    let mut report = Vec::new();
    for account in user.accounts_mut() {
        let due_expenses = account.due_regular_expenses(as_of);
        let due_incomes = account.due_regular_incomes(as_of);
        if due_expenses.is_empty() && due_incomes.is_empty() {
            continue;
        }

        // Try the balance changes on a copy so an overflow stops the run
        // before any row is written.
        let mut staged = account.clone();
        for (_, expense) in &due_expenses {
            staged.add_expense(expense.clone())?;
        }
        for (_, income) in &due_incomes {
            staged.add_income(income.clone())?;
        }

        let mut expense_templates: Vec<i64> = due_expenses.iter().map(|(t, _)| *t).collect();
        let mut income_templates: Vec<i64> = due_incomes.iter().map(|(t, _)| *t).collect();
        expense_templates.dedup();
        income_templates.dedup();
        let applied = Applied {
            account: account.name.clone(),
            expenses: due_expenses.len(),
            incomes: due_incomes.len(),
        };

        for (_, mut expense) in due_expenses {
            expense.id = store::insert_expense(conn, account.id, &expense)?;
            account.add_expense(expense)?;
        }
        for (_, mut income) in due_incomes {
            income.id = store::insert_income(conn, account.id, &income)?;
            account.add_income(income)?;
        }
        for template in account
            .regular_expenses()
            .iter()
            .filter(|r| expense_templates.contains(&r.entry.id))
        {
            store::update_regular_expense(conn, template)?;
        }
        for template in account
            .regular_incomes()
            .iter()
            .filter(|r| income_templates.contains(&r.entry.id))
        {
            store::update_regular_income(conn, template)?;
        }
        store::update_account(conn, account)?;
        tracing::info!(
            account = %applied.account,
            expenses = applied.expenses,
            incomes = applied.incomes,
            "recurring entries applied"
        );
        report.push(applied);
    }
    Ok(report)
}

fn run(conn: &Connection, user: &mut User, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = match sub.get_one::<String>("today") {
        Some(d) => parse_date(d)?,
        None => today(),
    };
    let report = run_due(conn, user, as_of)?;
    if report.is_empty() {
        println!("Nothing due on {}", as_of);
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let rows = report
        .into_iter()
        .map(|r| {
            let balance = user
                .account_by_name(&r.account)
                .map(|a| fmt_money(&a.balance(), &ccy))
                .unwrap_or_default();
            vec![
                r.account,
                r.expenses.to_string(),
                r.incomes.to_string(),
                balance,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Account", "Expenses", "Incomes", "Balance"], rows)
    );
    Ok(())
}
