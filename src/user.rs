// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::Account;
use crate::error::{Result, StoreError};

/// The authenticated user for the lifetime of one session.
///
/// Obtained from [`crate::store::login`] and handed by reference to whatever
/// needs it; [`User::logout`] ends the session. The password never lives here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub monthly_budget: Decimal,
    accounts: Vec<Account>,
}

impl User {
    pub fn new(id: i64, name: impl Into<String>, monthly_budget: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            monthly_budget,
            accounts: Vec::new(),
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn set_accounts(&mut self, accounts: Vec<Account>) {
        self.accounts = accounts;
    }

    pub fn add_account(&mut self, account: Account) {
        self.accounts.push(account);
    }

    /// Removes the first account equal to `account`. The others keep their
    /// relative order.
    pub fn delete_account(&mut self, account: &Account) -> Option<Account> {
        let pos = self.accounts.iter().position(|a| a == account)?;
        Some(self.accounts.remove(pos))
    }

    pub fn account(&self, id: i64) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn account_mut(&mut self, id: i64) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == id)
    }

    pub fn account_by_name(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    pub fn accounts_mut(&mut self) -> impl Iterator<Item = &mut Account> {
        self.accounts.iter_mut()
    }

    /// Moves `amount` between two of this user's accounts.
    pub fn transfer(&mut self, from_id: i64, to_id: i64, amount: Decimal) -> Result<()> {
        if from_id == to_id {
            return Err(StoreError::Validation(
                "cannot transfer money to the same account".into(),
            ));
        }
        let from = self.position(from_id)?;
        let to = self.position(to_id)?;
        let (source, target) = if from < to {
            let (head, tail) = self.accounts.split_at_mut(to);
            (&mut head[from], &mut tail[0])
        } else {
            let (head, tail) = self.accounts.split_at_mut(from);
            (&mut tail[0], &mut head[to])
        };
        source.transfer_money(amount, target)
    }

    pub fn total_balance(&self) -> Result<Decimal> {
        checked_sum(self.accounts.iter().map(Account::balance))
    }

    /// Money spent in the given month across all accounts: one-off expenses
    /// dated in it, plus the first occurrence of every recurring expense
    /// created in it. Later occurrences are stored as one-off expenses by the
    /// recurring run, so they are already in the first group.
    pub fn spent_in_month(&self, year: i32, month: u32) -> Result<Decimal> {
        let in_month = |d: &chrono::NaiveDate| d.year() == year && d.month() == month;
        let one_off = self
            .accounts
            .iter()
            .flat_map(|a| a.expenses())
            .filter(|e| in_month(&e.date))
            .map(|e| e.amount);
        let first_occurrences = self
            .accounts
            .iter()
            .flat_map(|a| a.regular_expenses())
            .filter(|r| in_month(&r.entry.date))
            .map(|r| r.entry.amount);
        checked_sum(one_off.chain(first_occurrences))
    }

    pub fn remaining_budget(&self, year: i32, month: u32) -> Result<Decimal> {
        self.monthly_budget
            .checked_sub(self.spent_in_month(year, month)?)
            .ok_or(StoreError::Overflow("budget"))
    }

    pub fn logout(self) {
        tracing::info!(user = %self.name, "session closed");
    }

    fn position(&self, id: i64) -> Result<usize> {
        self.accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| StoreError::not_found("account", id))
    }
}

fn checked_sum(mut amounts: impl Iterator<Item = Decimal>) -> Result<Decimal> {
    amounts.try_fold(Decimal::ZERO, |acc, a| {
        acc.checked_add(a).ok_or(StoreError::Overflow("total"))
    })
}
