// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Mapping between the ledger model and its SQLite tables.
//!
//! Every public operation prepares and runs its own statements against the
//! shared connection. Nothing is batched or wrapped in a transaction, so a
//! caller that performs an insert followed by an update can be interrupted in
//! between. Failures are logged here and returned to the caller.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params, types::ValueRef};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::account::{Account, AccountKind};
use crate::auth::{self, Verdict};
use crate::error::{Result, StoreError};
use crate::models::{
    Category, CategoryKind, DATE_FORMAT, Entry, Expense, Income, RegularEntry, RegularExpense,
    RegularIncome,
};
use crate::user::User;

/// Column layout of one of the four money-movement tables.
struct EntryTable {
    table: &'static str,
    amount: &'static str,
    /// Last-occurrence column; only the recurring tables have one.
    last: Option<&'static str>,
    categories: CategoryKind,
}

const EXPENSES: EntryTable = EntryTable {
    table: "expenses",
    amount: "price",
    last: None,
    categories: CategoryKind::Expense,
};

const REGULAR_EXPENSES: EntryTable = EntryTable {
    table: "regularExpenses",
    amount: "price",
    last: Some("lastExpense"),
    categories: CategoryKind::Expense,
};

const INCOMES: EntryTable = EntryTable {
    table: "incomes",
    amount: "money",
    last: None,
    categories: CategoryKind::Income,
};

const REGULAR_INCOMES: EntryTable = EntryTable {
    table: "regularIncomes",
    amount: "money",
    last: Some("lastIncome"),
    categories: CategoryKind::Income,
};

fn logged<T>(op: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::warn!(op, error = %e, "store operation failed");
    }
    result
}

fn changed(entity: &'static str, id: i64, rows: usize) -> Result<()> {
    if rows == 0 {
        return Err(StoreError::not_found(entity, id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Column readers

/// Parses a stored `YYYY-MM-DD` date, rejecting anything that is not a real
/// calendar day.
pub fn parse_stored_date(column: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| StoreError::InvalidDate {
        column,
        value: value.to_string(),
    })
}

fn read_date(r: &Row<'_>, idx: usize, column: &'static str) -> Result<NaiveDate> {
    let raw: String = r.get(idx)?;
    parse_stored_date(column, &raw)
}

/// Amounts are written as TEXT, but databases filled by older builds hold
/// REAL or INTEGER cells; all three are accepted.
fn read_decimal(r: &Row<'_>, idx: usize, column: &'static str) -> Result<Decimal> {
    let invalid = |value: String| StoreError::InvalidAmount { column, value };
    match r.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = String::from_utf8_lossy(bytes);
            s.trim().parse::<Decimal>().map_err(|_| invalid(s.to_string()))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).map_err(|_| invalid(f.to_string())),
        ValueRef::Null => Err(invalid("NULL".into())),
        ValueRef::Blob(_) => Err(invalid("<blob>".into())),
    }
}

// ---------------------------------------------------------------------------
// Categories

fn query_categories(conn: &Connection, kind: CategoryKind) -> Result<Vec<Category>> {
    let sql = format!("SELECT id, name FROM {} ORDER BY name", kind.table());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |r| {
        Ok(Category {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn categories(conn: &Connection, kind: CategoryKind) -> Result<Vec<Category>> {
    logged("load categories", query_categories(conn, kind))
}

pub fn expense_categories(conn: &Connection) -> Result<Vec<Category>> {
    categories(conn, CategoryKind::Expense)
}

pub fn income_categories(conn: &Connection) -> Result<Vec<Category>> {
    categories(conn, CategoryKind::Income)
}

fn category_map(conn: &Connection, kind: CategoryKind) -> Result<HashMap<i64, Category>> {
    Ok(query_categories(conn, kind)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect())
}

pub fn category_by_name(
    conn: &Connection,
    kind: CategoryKind,
    name: &str,
) -> Result<Option<Category>> {
    let sql = format!("SELECT id, name FROM {} WHERE name=?1", kind.table());
    let found = conn
        .query_row(&sql, params![name.trim()], |r| {
            Ok(Category {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })
        .optional()
        .map_err(StoreError::from);
    logged("find category", found)
}

pub fn insert_category(conn: &Connection, kind: CategoryKind, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation("category name is empty".into()));
    }
    let sql = format!("INSERT INTO {}(name) VALUES (?1)", kind.table());
    let inserted = conn
        .execute(&sql, params![name])
        .map(|_| conn.last_insert_rowid())
        .map_err(StoreError::from);
    let id = logged("insert category", inserted)?;
    tracing::info!(id, name, table = kind.table(), "new category added to database");
    Ok(id)
}

pub fn remove_category(conn: &Connection, kind: CategoryKind, id: i64) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id=?1", kind.table());
    let removed = conn
        .execute(&sql, params![id])
        .map_err(StoreError::from)
        .and_then(|n| changed("category", id, n));
    logged("remove category", removed)
}

// ---------------------------------------------------------------------------
// Money movements

/// The one row-mapping routine shared by all four record tables: prefetch
/// the category lookup, read the rows, resolve each category by id and let
/// `build` read any table-specific columns. An unknown category id maps to
/// `None`.
fn load_entries<T, F>(
    conn: &Connection,
    table: &EntryTable,
    account_id: i64,
    build: F,
) -> Result<Vec<T>>
where
    F: Fn(Entry, &Row<'_>) -> Result<T>,
{
    let categories = category_map(conn, table.categories)?;
    let extra = table
        .last
        .map(|col| format!(", frequency, account_id, {col}"))
        .unwrap_or_default();
    let sql = format!(
        "SELECT id, name, {}, category_id, date{} FROM {} WHERE account_id=?1 ORDER BY id",
        table.amount, extra, table.table
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![account_id])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let category_id: Option<i64> = r.get(3)?;
        let entry = Entry {
            id: r.get(0)?,
            name: r.get(1)?,
            amount: read_decimal(r, 2, table.amount)?,
            category: category_id.and_then(|id| categories.get(&id).cloned()),
            date: read_date(r, 4, "date")?,
        };
        out.push(build(entry, r)?);
    }
    tracing::debug!(table = table.table, account_id, rows = out.len(), "loaded");
    Ok(out)
}

fn plain_entry(entry: Entry, _: &Row<'_>) -> Result<Entry> {
    Ok(entry)
}

fn regular_entry(table: &'static EntryTable) -> impl Fn(Entry, &Row<'_>) -> Result<RegularEntry> {
    move |entry: Entry, r: &Row<'_>| {
        Ok(RegularEntry {
            entry,
            frequency: r.get(5)?,
            account_id: r.get(6)?,
            last_occurrence: read_date(r, 7, table.last.unwrap_or("last"))?,
        })
    }
}

pub fn load_expenses(conn: &Connection, account_id: i64) -> Result<Vec<Expense>> {
    logged(
        "load expenses",
        load_entries(conn, &EXPENSES, account_id, plain_entry),
    )
}

pub fn load_regular_expenses(conn: &Connection, account_id: i64) -> Result<Vec<RegularExpense>> {
    logged(
        "load regular expenses",
        load_entries(
            conn,
            &REGULAR_EXPENSES,
            account_id,
            regular_entry(&REGULAR_EXPENSES),
        ),
    )
}

pub fn load_incomes(conn: &Connection, account_id: i64) -> Result<Vec<Income>> {
    logged(
        "load incomes",
        load_entries(conn, &INCOMES, account_id, plain_entry),
    )
}

pub fn load_regular_incomes(conn: &Connection, account_id: i64) -> Result<Vec<RegularIncome>> {
    logged(
        "load regular incomes",
        load_entries(
            conn,
            &REGULAR_INCOMES,
            account_id,
            regular_entry(&REGULAR_INCOMES),
        ),
    )
}

fn insert_entry(conn: &Connection, table: &EntryTable, account_id: i64, e: &Entry) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {}(account_id, category_id, name, {}, date) VALUES (?1, ?2, ?3, ?4, ?5)",
        table.table, table.amount
    );
    conn.execute(
        &sql,
        params![
            account_id,
            e.category.as_ref().map(|c| c.id),
            e.name,
            e.amount.to_string(),
            e.date
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, account_id, table = table.table, "new record added to database");
    Ok(id)
}

fn insert_regular(conn: &Connection, table: &EntryTable, r: &RegularEntry) -> Result<i64> {
    let last = table.last.unwrap_or_default();
    let sql = format!(
        "INSERT INTO {}(account_id, category_id, name, {}, date, frequency, {})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        table.table, table.amount, last
    );
    conn.execute(
        &sql,
        params![
            r.account_id,
            r.entry.category.as_ref().map(|c| c.id),
            r.entry.name,
            r.entry.amount.to_string(),
            r.entry.date,
            r.frequency,
            r.last_occurrence
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, account_id = r.account_id, table = table.table, "new recurring record added to database");
    Ok(id)
}

fn update_entry(conn: &Connection, table: &EntryTable, e: &Entry) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET name=?1, {}=?2, category_id=?3, date=?4 WHERE id=?5",
        table.table, table.amount
    );
    let n = conn.execute(
        &sql,
        params![
            e.name,
            e.amount.to_string(),
            e.category.as_ref().map(|c| c.id),
            e.date,
            e.id
        ],
    )?;
    changed(table.table, e.id, n)
}

fn update_regular(conn: &Connection, table: &EntryTable, r: &RegularEntry) -> Result<()> {
    let last = table.last.unwrap_or_default();
    let sql = format!(
        "UPDATE {} SET name=?1, {}=?2, category_id=?3, date=?4, frequency=?5, {}=?6 WHERE id=?7",
        table.table, table.amount, last
    );
    let n = conn.execute(
        &sql,
        params![
            r.entry.name,
            r.entry.amount.to_string(),
            r.entry.category.as_ref().map(|c| c.id),
            r.entry.date,
            r.frequency,
            r.last_occurrence,
            r.entry.id
        ],
    )?;
    changed(table.table, r.entry.id, n)
}

fn remove_entry(conn: &Connection, table: &EntryTable, id: i64) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id=?1", table.table);
    let n = conn.execute(&sql, params![id])?;
    changed(table.table, id, n)
}

pub fn insert_expense(conn: &Connection, account_id: i64, expense: &Expense) -> Result<i64> {
    logged(
        "insert expense",
        insert_entry(conn, &EXPENSES, account_id, expense),
    )
}

pub fn insert_income(conn: &Connection, account_id: i64, income: &Income) -> Result<i64> {
    logged(
        "insert income",
        insert_entry(conn, &INCOMES, account_id, income),
    )
}

pub fn insert_regular_expense(conn: &Connection, expense: &RegularExpense) -> Result<i64> {
    logged(
        "insert regular expense",
        insert_regular(conn, &REGULAR_EXPENSES, expense),
    )
}

pub fn insert_regular_income(conn: &Connection, income: &RegularIncome) -> Result<i64> {
    logged(
        "insert regular income",
        insert_regular(conn, &REGULAR_INCOMES, income),
    )
}

pub fn update_expense(conn: &Connection, expense: &Expense) -> Result<()> {
    logged("update expense", update_entry(conn, &EXPENSES, expense))
}

pub fn update_income(conn: &Connection, income: &Income) -> Result<()> {
    logged("update income", update_entry(conn, &INCOMES, income))
}

pub fn update_regular_expense(conn: &Connection, expense: &RegularExpense) -> Result<()> {
    logged(
        "update regular expense",
        update_regular(conn, &REGULAR_EXPENSES, expense),
    )
}

pub fn update_regular_income(conn: &Connection, income: &RegularIncome) -> Result<()> {
    logged(
        "update regular income",
        update_regular(conn, &REGULAR_INCOMES, income),
    )
}

pub fn remove_expense(conn: &Connection, id: i64) -> Result<()> {
    logged("remove expense", remove_entry(conn, &EXPENSES, id))
}

pub fn remove_income(conn: &Connection, id: i64) -> Result<()> {
    logged("remove income", remove_entry(conn, &INCOMES, id))
}

pub fn remove_regular_expense(conn: &Connection, id: i64) -> Result<()> {
    logged(
        "remove regular expense",
        remove_entry(conn, &REGULAR_EXPENSES, id),
    )
}

pub fn remove_regular_income(conn: &Connection, id: i64) -> Result<()> {
    logged(
        "remove regular income",
        remove_entry(conn, &REGULAR_INCOMES, id),
    )
}

// ---------------------------------------------------------------------------
// Accounts

fn kind_from_row(r: &Row<'_>) -> Result<AccountKind> {
    let tag: i64 = r.get(3)?;
    match tag {
        AccountKind::PLAIN_TAG => Ok(AccountKind::Plain),
        AccountKind::CREDIT_TAG => AccountKind::credit(read_decimal(r, 4, "interest")?),
        AccountKind::SAVING_TAG => AccountKind::saving(
            read_decimal(r, 4, "interest")?,
            read_date(r, 5, "lastCapitalizationDate")?,
            r.get::<_, Option<u32>>(6)?.unwrap_or(0),
        ),
        other => Err(StoreError::UnknownAccountType(other)),
    }
}

fn kind_columns(kind: &AccountKind) -> (Option<String>, Option<NaiveDate>, Option<u32>) {
    match *kind {
        AccountKind::Plain => (None, None, None),
        AccountKind::Credit { interest_rate } => (Some(interest_rate.to_string()), None, None),
        AccountKind::Saving {
            interest_rate,
            last_capitalization,
            capitalization_period,
        } => (
            Some(interest_rate.to_string()),
            Some(last_capitalization),
            Some(capitalization_period),
        ),
    }
}

fn query_accounts(conn: &Connection, user_id: i64) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, balance, type, interest, lastCapitalizationDate, capitalizationPeriod
         FROM accounts WHERE user_id=?1 ORDER BY id",
    )?;
    let mut rows = stmt.query(params![user_id])?;
    let mut bare = Vec::new();
    while let Some(r) = rows.next()? {
        let mut account = Account::new(
            r.get::<_, String>(1)?,
            read_decimal(r, 2, "balance")?,
            kind_from_row(r)?,
        );
        account.id = r.get(0)?;
        bare.push(account);
    }

    let mut accounts = Vec::with_capacity(bare.len());
    for account in bare {
        let id = account.id;
        accounts.push(account.with_records(
            load_entries(conn, &EXPENSES, id, plain_entry)?,
            load_entries(conn, &REGULAR_EXPENSES, id, regular_entry(&REGULAR_EXPENSES))?,
            load_entries(conn, &INCOMES, id, plain_entry)?,
            load_entries(conn, &REGULAR_INCOMES, id, regular_entry(&REGULAR_INCOMES))?,
        ));
    }
    Ok(accounts)
}

/// Every account of the user, each with its four record lists, in creation
/// order.
pub fn load_accounts(conn: &Connection, user_id: i64) -> Result<Vec<Account>> {
    logged("load accounts", query_accounts(conn, user_id))
}

pub fn insert_account(conn: &Connection, user_id: i64, account: &Account) -> Result<i64> {
    let (interest, last_cap, period) = kind_columns(&account.kind);
    let inserted = conn
        .execute(
            "INSERT INTO accounts(user_id, name, balance, type, interest, lastCapitalizationDate, capitalizationPeriod)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                account.name,
                account.balance().to_string(),
                account.kind.tag(),
                interest,
                last_cap,
                period
            ],
        )
        .map(|_| conn.last_insert_rowid())
        .map_err(StoreError::from);
    let id = logged("insert account", inserted)?;
    tracing::info!(id, user_id, name = %account.name, "new account added to database");
    Ok(id)
}

/// Writes name, balance and the kind-specific columns of `account`.
pub fn update_account(conn: &Connection, account: &Account) -> Result<()> {
    let (interest, last_cap, period) = kind_columns(&account.kind);
    let updated = conn
        .execute(
            "UPDATE accounts SET name=?1, balance=?2, type=?3, interest=?4,
                 lastCapitalizationDate=?5, capitalizationPeriod=?6
             WHERE id=?7",
            params![
                account.name,
                account.balance().to_string(),
                account.kind.tag(),
                interest,
                last_cap,
                period,
                account.id
            ],
        )
        .map_err(StoreError::from)
        .and_then(|n| changed("account", account.id, n));
    logged("update account", updated)
}

pub fn delete_account(conn: &Connection, id: i64) -> Result<()> {
    let removed = conn
        .execute("DELETE FROM accounts WHERE id=?1", params![id])
        .map_err(StoreError::from)
        .and_then(|n| changed("account", id, n));
    logged("delete account", removed)
}

// ---------------------------------------------------------------------------
// Users

struct Credentials {
    id: i64,
    name: String,
    password: String,
    monthly_budget: Decimal,
}

fn credentials(conn: &Connection, name: &str) -> Result<Option<Credentials>> {
    let mut stmt =
        conn.prepare("SELECT id, name, password, monthlyBudget FROM users WHERE name=?1")?;
    let mut rows = stmt.query(params![name])?;
    match rows.next()? {
        Some(r) => Ok(Some(Credentials {
            id: r.get(0)?,
            name: r.get(1)?,
            password: r.get(2)?,
            monthly_budget: read_decimal(r, 3, "monthlyBudget")?,
        })),
        None => Ok(None),
    }
}

pub fn insert_user(
    conn: &Connection,
    name: &str,
    password: &str,
    monthly_budget: Decimal,
) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() || password.is_empty() {
        return Err(StoreError::Validation(
            "user name and password are required".into(),
        ));
    }
    let hash = auth::hash_password(password)?;
    let inserted = conn
        .execute(
            "INSERT INTO users(name, password, monthlyBudget) VALUES (?1, ?2, ?3)",
            params![name, hash, monthly_budget.to_string()],
        )
        .map(|_| conn.last_insert_rowid())
        .map_err(StoreError::from);
    let id = logged("insert user", inserted)?;
    tracing::info!(id, name, "new user added to database");
    Ok(id)
}

pub fn validate_password(conn: &Connection, name: &str, password: &str) -> Result<bool> {
    let creds = logged("validate password", credentials(conn, name))?;
    let valid = creds
        .map(|c| auth::verify_password(password, &c.password) != Verdict::Mismatch)
        .unwrap_or(false);
    if valid {
        tracing::info!(name, "validated password");
    } else {
        tracing::info!(name, "incorrect password");
    }
    Ok(valid)
}

fn open_session(conn: &Connection, name: &str, password: &str) -> Result<Option<User>> {
    let Some(creds) = credentials(conn, name)? else {
        tracing::info!(name, "unknown user");
        return Ok(None);
    };
    match auth::verify_password(password, &creds.password) {
        Verdict::Mismatch => {
            tracing::info!(name, "incorrect password");
            return Ok(None);
        }
        Verdict::LegacyMatch => {
            tracing::warn!(name, "plaintext password found, rehashing");
            let hash = auth::hash_password(password)?;
            conn.execute(
                "UPDATE users SET password=?1 WHERE id=?2",
                params![hash, creds.id],
            )?;
        }
        Verdict::Match => {}
    }
    let mut user = User::new(creds.id, creds.name, creds.monthly_budget);
    user.set_accounts(query_accounts(conn, creds.id)?);
    tracing::info!(user = %user.name, accounts = user.accounts().len(), "user initialization finished");
    Ok(Some(user))
}

/// Authenticates `name` and loads the full session. `Ok(None)` means unknown
/// user or wrong password.
pub fn login(conn: &Connection, name: &str, password: &str) -> Result<Option<User>> {
    logged("login", open_session(conn, name, password))
}

pub fn update_user(conn: &Connection, user: &User) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE users SET name=?1, monthlyBudget=?2 WHERE id=?3",
            params![user.name, user.monthly_budget.to_string(), user.id],
        )
        .map_err(StoreError::from)
        .and_then(|n| changed("user", user.id, n));
    logged("update user", updated)
}
