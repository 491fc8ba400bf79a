// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage and display format for every date in the ledger.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Which lookup table a category lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn table(self) -> &'static str {
        match self {
            CategoryKind::Expense => "expensesCategories",
            CategoryKind::Income => "incomesCategories",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "expenses" => Some(CategoryKind::Expense),
            "income" | "incomes" => Some(CategoryKind::Income),
            _ => None,
        }
    }
}

/// A single money movement. Whether it debits or credits the account is
/// decided by the list (and table) it belongs to, so `amount` stays positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub category: Option<Category>,
    pub date: NaiveDate,
}

pub type Expense = Entry;
pub type Income = Entry;

impl Entry {
    /// A record that has not been written yet; the store assigns the id.
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        category: Option<Category>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            amount,
            category,
            date,
        }
    }
}

/// Recurring template: fires every `frequency` days counted from
/// `last_occurrence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub frequency: u32,
    pub account_id: i64,
    pub last_occurrence: NaiveDate,
}

pub type RegularExpense = RegularEntry;
pub type RegularIncome = RegularEntry;

impl RegularEntry {
    /// The first occurrence is the template's own date.
    pub fn new(entry: Entry, frequency: u32, account_id: i64) -> Self {
        let last_occurrence = entry.date;
        Self {
            entry,
            frequency,
            account_id,
            last_occurrence,
        }
    }

    /// `None` when the next occurrence falls past the last representable
    /// date.
    pub fn next_due(&self) -> Option<NaiveDate> {
        self.last_occurrence
            .checked_add_days(Days::new(u64::from(self.frequency)))
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.frequency > 0 && self.next_due().is_some_and(|next| today >= next)
    }

    /// One concrete entry for the occurrence on `date`, not yet stored.
    pub fn occurrence(&self, date: NaiveDate) -> Entry {
        Entry::new(
            self.entry.name.clone(),
            self.entry.amount,
            self.entry.category.clone(),
            date,
        )
    }
}
