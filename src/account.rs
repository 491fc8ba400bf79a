// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::error::{Result, StoreError};
use crate::models::{Entry, Expense, Income, RegularEntry, RegularExpense, RegularIncome};

/// The closed set of account flavours. `tag()` is the integer written to the
/// `accounts.type` column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AccountKind {
    Plain,
    Credit {
        interest_rate: Decimal,
    },
    Saving {
        interest_rate: Decimal,
        last_capitalization: NaiveDate,
        /// Days between two capitalizations.
        capitalization_period: u32,
    },
}

impl AccountKind {
    pub const PLAIN_TAG: i64 = 1;
    pub const CREDIT_TAG: i64 = 2;
    pub const SAVING_TAG: i64 = 3;

    pub fn credit(interest_rate: Decimal) -> Result<Self> {
        check_rate(interest_rate)?;
        Ok(AccountKind::Credit { interest_rate })
    }

    pub fn saving(
        interest_rate: Decimal,
        last_capitalization: NaiveDate,
        capitalization_period: u32,
    ) -> Result<Self> {
        check_rate(interest_rate)?;
        if capitalization_period == 0 {
            return Err(StoreError::Validation(
                "capitalization period must be at least one day".into(),
            ));
        }
        Ok(AccountKind::Saving {
            interest_rate,
            last_capitalization,
            capitalization_period,
        })
    }

    pub fn tag(&self) -> i64 {
        match self {
            AccountKind::Plain => Self::PLAIN_TAG,
            AccountKind::Credit { .. } => Self::CREDIT_TAG,
            AccountKind::Saving { .. } => Self::SAVING_TAG,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Plain => "plain",
            AccountKind::Credit { .. } => "credit",
            AccountKind::Saving { .. } => "saving",
        }
    }

    pub fn interest_rate(&self) -> Option<Decimal> {
        match self {
            AccountKind::Plain => None,
            AccountKind::Credit { interest_rate } | AccountKind::Saving { interest_rate, .. } => {
                Some(*interest_rate)
            }
        }
    }
}

fn check_rate(rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO {
        return Err(StoreError::Validation(format!(
            "interest rate must not be negative, got {}",
            rate
        )));
    }
    Ok(())
}

/// A named balance together with every record applied to it.
///
/// The record lists are only reachable through the methods below so that each
/// amount hits the balance exactly once. Nothing here guards against
/// overdraft: balances may go negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    balance: Decimal,
    pub kind: AccountKind,
    expenses: Vec<Expense>,
    regular_expenses: Vec<RegularExpense>,
    incomes: Vec<Income>,
    regular_incomes: Vec<RegularIncome>,
}

impl Account {
    pub fn new(name: impl Into<String>, balance: Decimal, kind: AccountKind) -> Self {
        Self {
            id: 0,
            name: name.into(),
            balance,
            kind,
            expenses: Vec::new(),
            regular_expenses: Vec::new(),
            incomes: Vec::new(),
            regular_incomes: Vec::new(),
        }
    }

    pub fn plain(name: impl Into<String>, balance: Decimal) -> Self {
        Self::new(name, balance, AccountKind::Plain)
    }

    /// Attach records loaded from storage. The stored balance already
    /// reflects them, so nothing is re-applied.
    pub(crate) fn with_records(
        mut self,
        expenses: Vec<Expense>,
        regular_expenses: Vec<RegularExpense>,
        incomes: Vec<Income>,
        regular_incomes: Vec<RegularIncome>,
    ) -> Self {
        self.expenses = expenses;
        self.regular_expenses = regular_expenses;
        self.incomes = incomes;
        self.regular_incomes = regular_incomes;
        self
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn regular_expenses(&self) -> &[RegularExpense] {
        &self.regular_expenses
    }

    pub fn incomes(&self) -> &[Income] {
        &self.incomes
    }

    pub fn regular_incomes(&self) -> &[RegularIncome] {
        &self.regular_incomes
    }

    /// Fails with [`StoreError::Overflow`] instead of wrapping or panicking;
    /// the balance is left untouched on error.
    pub fn increase_balance(&mut self, amount: Decimal) -> Result<()> {
        self.balance = credited(self.balance, amount)?;
        Ok(())
    }

    pub fn decrease_balance(&mut self, amount: Decimal) -> Result<()> {
        self.balance = debited(self.balance, amount)?;
        Ok(())
    }

    /// Credits `target` first, then debits `self`. The two steps are
    /// independent; a caller that stops in between sees only the credit.
    pub fn transfer_money(&mut self, amount: Decimal, target: &mut Account) -> Result<()> {
        let remaining = debited(self.balance, amount)?;
        target.increase_balance(amount)?;
        self.balance = remaining;
        Ok(())
    }

    pub fn add_expense(&mut self, expense: Expense) -> Result<()> {
        let balance = debited(self.balance, expense.amount)?;
        self.expenses.push(expense);
        self.balance = balance;
        Ok(())
    }

    pub fn add_income(&mut self, income: Income) -> Result<()> {
        let balance = credited(self.balance, income.amount)?;
        self.incomes.push(income);
        self.balance = balance;
        Ok(())
    }

    /// Registers the template and applies its first occurrence.
    pub fn add_regular_expense(&mut self, expense: RegularExpense) -> Result<()> {
        let balance = debited(self.balance, expense.entry.amount)?;
        self.regular_expenses.push(expense);
        self.balance = balance;
        Ok(())
    }

    /// Registers the template and applies its first occurrence.
    pub fn add_regular_income(&mut self, income: RegularIncome) -> Result<()> {
        let balance = credited(self.balance, income.entry.amount)?;
        self.regular_incomes.push(income);
        self.balance = balance;
        Ok(())
    }

    pub fn remove_expense(&mut self, id: i64) -> Result<Option<Expense>> {
        let Some(pos) = self.expenses.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        self.balance = credited(self.balance, self.expenses[pos].amount)?;
        Ok(Some(self.expenses.remove(pos)))
    }

    pub fn remove_income(&mut self, id: i64) -> Result<Option<Income>> {
        let Some(pos) = self.incomes.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        self.balance = debited(self.balance, self.incomes[pos].amount)?;
        Ok(Some(self.incomes.remove(pos)))
    }

    /// Past occurrences stay applied; only future ones stop.
    pub fn remove_regular_expense(&mut self, id: i64) -> Option<RegularExpense> {
        let pos = self.regular_expenses.iter().position(|r| r.entry.id == id)?;
        Some(self.regular_expenses.remove(pos))
    }

    pub fn remove_regular_income(&mut self, id: i64) -> Option<RegularIncome> {
        let pos = self.regular_incomes.iter().position(|r| r.entry.id == id)?;
        Some(self.regular_incomes.remove(pos))
    }

    /// Replaces the expense with the same id and returns the previous version.
    pub fn amend_expense(&mut self, updated: Expense) -> Result<Option<Expense>> {
        let Some(pos) = self.expenses.iter().position(|e| e.id == updated.id) else {
            return Ok(None);
        };
        let balance = credited(self.balance, self.expenses[pos].amount)
            .and_then(|b| debited(b, updated.amount))?;
        self.balance = balance;
        Ok(Some(std::mem::replace(&mut self.expenses[pos], updated)))
    }

    pub fn amend_income(&mut self, updated: Income) -> Result<Option<Income>> {
        let Some(pos) = self.incomes.iter().position(|e| e.id == updated.id) else {
            return Ok(None);
        };
        let balance = debited(self.balance, self.incomes[pos].amount)
            .and_then(|b| credited(b, updated.amount))?;
        self.balance = balance;
        Ok(Some(std::mem::replace(&mut self.incomes[pos], updated)))
    }

    /// Advances every due expense template and returns `(template id, entry)`
    /// for each occurrence that fired. The entries are neither stored nor
    /// applied yet.
    pub fn due_regular_expenses(&mut self, today: NaiveDate) -> Vec<(i64, Expense)> {
        collect_due(&mut self.regular_expenses, today)
    }

    pub fn due_regular_incomes(&mut self, today: NaiveDate) -> Vec<(i64, Income)> {
        collect_due(&mut self.regular_incomes, today)
    }

    /// Applies accrued interest on a saving account, once per full
    /// capitalization period elapsed since the last one. `interest_rate` is a
    /// yearly percentage. Returns the interest added; zero for other kinds.
    /// On overflow nothing changes, not even the capitalization date.
    pub fn capitalize(&mut self, today: NaiveDate) -> Result<Decimal> {
        let AccountKind::Saving {
            interest_rate,
            last_capitalization,
            capitalization_period,
        } = self.kind
        else {
            return Ok(Decimal::ZERO);
        };
        if capitalization_period == 0 {
            return Ok(Decimal::ZERO);
        }
        let periods = (today - last_capitalization).num_days() / i64::from(capitalization_period);
        if periods < 1 {
            return Ok(Decimal::ZERO);
        }

        let overflow = || StoreError::Overflow("interest");
        let factor = (interest_rate / Decimal::ONE_HUNDRED)
            .checked_mul(Decimal::from(capitalization_period))
            .and_then(|f| f.checked_div(Decimal::from(365)))
            .ok_or_else(overflow)?;
        let mut balance = self.balance;
        let mut added = Decimal::ZERO;
        for _ in 0..periods {
            if balance <= Decimal::ZERO {
                break;
            }
            let interest = balance.checked_mul(factor).ok_or_else(overflow)?.round_dp(2);
            balance = credited(balance, interest)?;
            added = added.checked_add(interest).ok_or_else(overflow)?;
        }
        self.balance = balance;
        self.kind = AccountKind::Saving {
            interest_rate,
            last_capitalization: last_capitalization
                + Duration::days(periods * i64::from(capitalization_period)),
            capitalization_period,
        };
        Ok(added)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.balance.round_dp(2))
    }
}

fn credited(balance: Decimal, amount: Decimal) -> Result<Decimal> {
    balance
        .checked_add(amount)
        .ok_or(StoreError::Overflow("balance"))
}

fn debited(balance: Decimal, amount: Decimal) -> Result<Decimal> {
    balance
        .checked_sub(amount)
        .ok_or(StoreError::Overflow("balance"))
}

fn collect_due(templates: &mut [RegularEntry], today: NaiveDate) -> Vec<(i64, Entry)> {
    let mut fired = Vec::new();
    for template in templates.iter_mut() {
        while template.is_due(today) {
            let Some(date) = template.next_due() else {
                break;
            };
            fired.push((template.entry.id, template.occurrence(date)));
            template.last_occurrence = date;
        }
    }
    fired
}
