// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Datelike;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::user::User;
use crate::utils::{fmt_money, get_currency, parse_month, pretty_table, today};

pub fn handle(conn: &Connection, user: &User, m: &clap::ArgMatches) -> Result<()> {
    let (year, month) = match m.get_one::<String>("month") {
        Some(s) => parse_month(s)?,
        None => {
            let d = today();
            (d.year(), d.month())
        }
    };
    let ccy = get_currency(conn)?;

    let mut rows: Vec<Vec<String>> = user
        .accounts()
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.kind.label().to_string(),
                fmt_money(&a.balance(), &ccy),
            ]
        })
        .collect();
    rows.push(vec![
        "TOTAL".into(),
        String::new(),
        fmt_money(&user.total_balance()?, &ccy),
    ]);
    println!("{}", pretty_table(&["Account", "Type", "Balance"], rows));

    let spent = user.spent_in_month(year, month)?;
    let remaining = user.remaining_budget(year, month)?;
    println!(
        "{}",
        pretty_table(
            &["Month", "Budget", "Spent", "Remaining"],
            vec![vec![
                format!("{:04}-{:02}", year, month),
                fmt_money(&user.monthly_budget, &ccy),
                fmt_money(&spent, &ccy),
                fmt_money(&remaining, &ccy),
            ]],
        )
    );
    if remaining < Decimal::ZERO {
        println!("Over budget by {}", fmt_money(&-remaining, &ccy));
    }
    Ok(())
}
