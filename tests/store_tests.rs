// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use homeledger::account::{Account, AccountKind};
use homeledger::db;
use homeledger::error::StoreError;
use homeledger::models::{CategoryKind, Entry, RegularEntry};
use homeledger::store;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse::<Decimal>().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Schema plus one user row. The password is never checked here.
fn setup() -> (Connection, i64) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO users(name, password, monthlyBudget) VALUES ('tom', 'unused', '1500')",
        [],
    )
    .unwrap();
    let user_id = conn.last_insert_rowid();
    (conn, user_id)
}

fn insert(conn: &Connection, user_id: i64, mut account: Account) -> Account {
    account.id = store::insert_account(conn, user_id, &account).unwrap();
    account
}

#[test]
fn accounts_round_trip_for_every_kind() {
    let (conn, user_id) = setup();
    let plain = insert(&conn, user_id, Account::plain("Checking", d("1000.50")));
    let credit = insert(
        &conn,
        user_id,
        Account::new("Card", d("-250"), AccountKind::credit(d("19.9")).unwrap()),
    );
    let saving = insert(
        &conn,
        user_id,
        Account::new(
            "Savings",
            d("5000"),
            AccountKind::saving(d("2.5"), date("2024-01-01"), 30).unwrap(),
        ),
    );

    let loaded = store::load_accounts(&conn, user_id).unwrap();
    assert_eq!(loaded, vec![plain, credit, saving]);
    assert!(store::load_accounts(&conn, user_id + 1).unwrap().is_empty());
}

#[test]
fn records_round_trip_with_categories() {
    let (conn, user_id) = setup();
    let acc = insert(&conn, user_id, Account::plain("Checking", d("1000")));
    let food_id = store::insert_category(&conn, CategoryKind::Expense, "Food").unwrap();
    let salary_id = store::insert_category(&conn, CategoryKind::Income, "Salary").unwrap();
    let food = store::category_by_name(&conn, CategoryKind::Expense, "Food")
        .unwrap()
        .unwrap();
    let salary = store::category_by_name(&conn, CategoryKind::Income, "Salary")
        .unwrap()
        .unwrap();
    assert_eq!((food.id, salary.id), (food_id, salary_id));

    let mut groceries = Entry::new("Groceries", d("150"), Some(food.clone()), date("2024-03-01"));
    groceries.id = store::insert_expense(&conn, acc.id, &groceries).unwrap();
    let mut pay = Entry::new("Pay", d("3200.75"), Some(salary.clone()), date("2024-03-25"));
    pay.id = store::insert_income(&conn, acc.id, &pay).unwrap();

    let mut gym = RegularEntry::new(
        Entry::new("Gym", d("45"), Some(food), date("2024-02-15")),
        30,
        acc.id,
    );
    gym.entry.id = store::insert_regular_expense(&conn, &gym).unwrap();
    let mut rent = RegularEntry::new(
        Entry::new("Sublet", d("600"), Some(salary), date("2024-02-01")),
        31,
        acc.id,
    );
    rent.entry.id = store::insert_regular_income(&conn, &rent).unwrap();

    assert_eq!(store::load_expenses(&conn, acc.id).unwrap(), vec![groceries]);
    assert_eq!(store::load_incomes(&conn, acc.id).unwrap(), vec![pay]);
    assert_eq!(
        store::load_regular_expenses(&conn, acc.id).unwrap(),
        vec![gym]
    );
    assert_eq!(
        store::load_regular_incomes(&conn, acc.id).unwrap(),
        vec![rent]
    );

    let loaded = store::load_accounts(&conn, user_id).unwrap();
    assert_eq!(loaded[0].expenses().len(), 1);
    assert_eq!(loaded[0].incomes().len(), 1);
    assert_eq!(loaded[0].regular_expenses().len(), 1);
    assert_eq!(loaded[0].regular_incomes().len(), 1);
    // Loading never re-applies stored records.
    assert_eq!(loaded[0].balance(), d("1000"));
}

#[test]
fn unknown_category_id_maps_to_none() {
    let (conn, user_id) = setup();
    let acc = insert(&conn, user_id, Account::plain("Checking", d("0")));
    conn.execute(
        "INSERT INTO expenses(account_id, category_id, name, price, date) VALUES (?1, 99, 'Misc', '3', '2024-03-01')",
        params![acc.id],
    )
    .unwrap();
    let expenses = store::load_expenses(&conn, acc.id).unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].category, None);
}

#[test]
fn malformed_dates_are_rejected() {
    let (conn, user_id) = setup();
    let acc = insert(&conn, user_id, Account::plain("Checking", d("0")));
    for bad in ["2024-02-30", "2024.03.01", "01-03-2024"] {
        conn.execute("DELETE FROM incomes", []).unwrap();
        conn.execute(
            "INSERT INTO incomes(account_id, name, money, date) VALUES (?1, 'x', '1', ?2)",
            params![acc.id, bad],
        )
        .unwrap();
        let err = store::load_incomes(&conn, acc.id).unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidDate { ref value, .. } if value == bad),
            "{} gave {:?}",
            bad,
            err
        );
    }
}

#[test]
fn legacy_numeric_amounts_are_read() {
    let (conn, user_id) = setup();
    conn.execute(
        "INSERT INTO accounts(user_id, name, balance, type) VALUES (?1, 'Old', 99.5, 1)",
        params![user_id],
    )
    .unwrap();
    let acc_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO expenses(account_id, name, price, date) VALUES (?1, 'Coffee', 4, '2024-03-01')",
        params![acc_id],
    )
    .unwrap();
    let loaded = store::load_accounts(&conn, user_id).unwrap();
    assert_eq!(loaded[0].balance(), d("99.5"));
    assert_eq!(loaded[0].expenses()[0].amount, d("4"));
}

#[test]
fn unknown_account_type_is_an_error() {
    let (conn, user_id) = setup();
    conn.execute(
        "INSERT INTO accounts(user_id, name, balance, type) VALUES (?1, 'Weird', '0', 7)",
        params![user_id],
    )
    .unwrap();
    assert!(matches!(
        store::load_accounts(&conn, user_id),
        Err(StoreError::UnknownAccountType(7))
    ));
}

#[test]
fn updates_and_deletes_hit_one_row() {
    let (conn, user_id) = setup();
    let mut acc = insert(&conn, user_id, Account::plain("Checking", d("100")));
    let mut e = Entry::new("Lunch", d("10"), None, date("2024-03-02"));
    e.id = store::insert_expense(&conn, acc.id, &e).unwrap();

    acc.add_expense(e.clone()).unwrap();
    acc.name = "Main".into();
    store::update_account(&conn, &acc).unwrap();

    e.amount = d("12");
    e.name = "Brunch".into();
    store::update_expense(&conn, &e).unwrap();

    let loaded = store::load_accounts(&conn, user_id).unwrap();
    assert_eq!(loaded[0].name, "Main");
    assert_eq!(loaded[0].balance(), d("90"));
    assert_eq!(loaded[0].expenses(), &[e.clone()]);

    store::remove_expense(&conn, e.id).unwrap();
    assert!(store::load_expenses(&conn, acc.id).unwrap().is_empty());
    assert!(matches!(
        store::remove_expense(&conn, e.id),
        Err(StoreError::NotFound { .. })
    ));

    let mut ghost = acc.clone();
    ghost.id = 404;
    assert!(matches!(
        store::update_account(&conn, &ghost),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn deleting_an_account_drops_its_records() {
    let (conn, user_id) = setup();
    let acc = insert(&conn, user_id, Account::plain("Checking", d("100")));
    let e = Entry::new("Lunch", d("10"), None, date("2024-03-02"));
    store::insert_expense(&conn, acc.id, &e).unwrap();
    store::delete_account(&conn, acc.id).unwrap();
    assert!(store::load_expenses(&conn, acc.id).unwrap().is_empty());
    assert!(store::load_accounts(&conn, user_id).unwrap().is_empty());
}

#[test]
fn categories_are_unique_and_sorted() {
    let (conn, _) = setup();
    store::insert_category(&conn, CategoryKind::Expense, "Transport").unwrap();
    store::insert_category(&conn, CategoryKind::Expense, " Food ").unwrap();
    assert!(store::insert_category(&conn, CategoryKind::Expense, "Food").is_err());
    assert!(matches!(
        store::insert_category(&conn, CategoryKind::Expense, "  "),
        Err(StoreError::Validation(_))
    ));
    // Same name in the other table is fine.
    store::insert_category(&conn, CategoryKind::Income, "Food").unwrap();

    let names: Vec<String> = store::expense_categories(&conn)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Food", "Transport"]);
    assert_eq!(store::income_categories(&conn).unwrap().len(), 1);

    let food = store::category_by_name(&conn, CategoryKind::Expense, "Food")
        .unwrap()
        .unwrap();
    store::remove_category(&conn, CategoryKind::Expense, food.id).unwrap();
    assert!(
        store::category_by_name(&conn, CategoryKind::Expense, "Food")
            .unwrap()
            .is_none()
    );
}

#[test]
fn login_verifies_hash_and_loads_session() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let user_id = store::insert_user(&conn, "alice", "s3cret", d("1200")).unwrap();
    let stored: String = conn
        .query_row("SELECT password FROM users WHERE id=?1", params![user_id], |r| {
            r.get(0)
        })
        .unwrap();
    assert!(stored.starts_with("$argon2"));
    assert_ne!(stored, "s3cret");

    let acc = insert(&conn, user_id, Account::plain("Checking", d("10")));

    assert!(store::login(&conn, "alice", "wrong").unwrap().is_none());
    assert!(store::login(&conn, "bob", "s3cret").unwrap().is_none());
    assert!(!store::validate_password(&conn, "alice", "wrong").unwrap());
    assert!(store::validate_password(&conn, "alice", "s3cret").unwrap());

    let mut user = store::login(&conn, "alice", "s3cret").unwrap().unwrap();
    assert_eq!(user.id, user_id);
    assert_eq!(user.monthly_budget, d("1200"));
    assert_eq!(user.accounts(), &[acc]);

    user.monthly_budget = d("1300");
    store::update_user(&conn, &user).unwrap();
    user.logout();
    let again = store::login(&conn, "alice", "s3cret").unwrap().unwrap();
    assert_eq!(again.monthly_budget, d("1300"));
}

#[test]
fn plaintext_passwords_are_upgraded_on_login() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO users(name, password, monthlyBudget) VALUES ('legacy', 'hunter2', 0)",
        [],
    )
    .unwrap();

    let user = store::login(&conn, "legacy", "hunter2").unwrap();
    assert!(user.is_some());
    let stored: String = conn
        .query_row("SELECT password FROM users WHERE name='legacy'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert!(stored.starts_with("$argon2"));
    assert!(store::validate_password(&conn, "legacy", "hunter2").unwrap());
}

#[test]
fn file_database_keeps_data_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");

    let conn = db::open_or_init(Some(path.as_path())).unwrap();
    assert!(db::is_connected(&conn));
    conn.execute(
        "INSERT INTO users(name, password, monthlyBudget) VALUES ('tom', 'unused', '0')",
        [],
    )
    .unwrap();
    let user_id = conn.last_insert_rowid();
    let acc = insert(&conn, user_id, Account::plain("Checking", d("42.42")));
    db::close(conn).unwrap();

    let conn = db::open_or_init(Some(path.as_path())).unwrap();
    assert_eq!(store::load_accounts(&conn, user_id).unwrap(), vec![acc]);
    db::close(conn).unwrap();
}
