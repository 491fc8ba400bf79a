// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use homeledger::account::{Account, AccountKind};
use homeledger::error::StoreError;
use homeledger::models::{Category, Entry, RegularEntry};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse::<Decimal>().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn food() -> Category {
    Category {
        id: 1,
        name: "Food".into(),
    }
}

#[test]
fn groceries_scenario() {
    let mut checking = Account::plain("Checking", d("1000"));
    checking.add_expense(Entry::new(
        "Groceries",
        d("150"),
        Some(food()),
        date("2024-03-01"),
    ))
    .unwrap();
    assert_eq!(checking.balance(), d("850"));
    assert_eq!(checking.expenses().len(), 1);
}

#[test]
fn add_expense_decreases_by_amount_and_appends_last() {
    let mut acc = Account::plain("A", d("20.00"));
    for (i, amount) in ["0.01", "5", "19.99", "300"].iter().enumerate() {
        let before = acc.balance();
        let mut e = Entry::new("e", d(amount), None, date("2024-01-01"));
        e.id = i as i64 + 1;
        acc.add_expense(e.clone()).unwrap();
        assert_eq!(acc.balance(), before - e.amount);
        assert_eq!(acc.expenses().last(), Some(&e));
    }
    // No overdraft protection.
    assert_eq!(acc.balance(), d("-305.00"));
}

#[test]
fn add_income_increases_balance() {
    let mut acc = Account::plain("A", Decimal::ZERO);
    acc.add_income(Entry::new("Salary", d("2500"), None, date("2024-03-25")))
        .unwrap();
    assert_eq!(acc.balance(), d("2500"));
    assert_eq!(acc.incomes().len(), 1);
    assert!(acc.expenses().is_empty());
}

#[test]
fn transfer_matches_two_independent_steps() {
    let mut source = Account::plain("Source", d("100"));
    let mut target = Account::plain("Target", d("10"));
    source.transfer_money(d("40"), &mut target).unwrap();
    assert_eq!(source.balance(), d("60"));
    assert_eq!(target.balance(), d("50"));

    // The same effect, performed step by step; after the first step only the
    // target has moved.
    let mut s2 = Account::plain("Source", d("100"));
    let mut t2 = Account::plain("Target", d("10"));
    t2.increase_balance(d("40")).unwrap();
    assert_eq!(s2.balance(), d("100"));
    assert_eq!(t2.balance(), d("50"));
    s2.decrease_balance(d("40")).unwrap();
    assert_eq!(s2, source);
    assert_eq!(t2, target);
}

#[test]
fn remove_and_amend_keep_balance_consistent() {
    let mut acc = Account::plain("A", d("100"));
    let mut e = Entry::new("Lunch", d("12.50"), None, date("2024-03-02"));
    e.id = 7;
    acc.add_expense(e.clone()).unwrap();
    assert_eq!(acc.balance(), d("87.50"));

    let mut changed = e.clone();
    changed.amount = d("20");
    let previous = acc.amend_expense(changed).unwrap().unwrap();
    assert_eq!(previous.amount, d("12.50"));
    assert_eq!(acc.balance(), d("80.00"));

    assert!(acc.remove_expense(99).unwrap().is_none());
    let removed = acc.remove_expense(7).unwrap().unwrap();
    assert_eq!(removed.amount, d("20"));
    assert_eq!(acc.balance(), d("100.00"));
    assert!(acc.expenses().is_empty());
}

#[test]
fn amend_income_applies_difference() {
    let mut acc = Account::plain("A", Decimal::ZERO);
    let mut i = Entry::new("Salary", d("1000"), None, date("2024-03-25"));
    i.id = 3;
    acc.add_income(i.clone()).unwrap();
    i.amount = d("900");
    acc.amend_income(i).unwrap().unwrap();
    assert_eq!(acc.balance(), d("900"));
    assert_eq!(acc.remove_income(3).unwrap().map(|r| r.amount), Some(d("900")));
    assert_eq!(acc.balance(), Decimal::ZERO);
}

#[test]
fn kinds_validate_rates_and_periods() {
    assert!(matches!(
        AccountKind::credit(d("-0.5")),
        Err(StoreError::Validation(_))
    ));
    assert!(AccountKind::credit(Decimal::ZERO).is_ok());
    assert!(matches!(
        AccountKind::saving(d("2"), date("2024-01-01"), 0),
        Err(StoreError::Validation(_))
    ));
    let saving = AccountKind::saving(d("2"), date("2024-01-01"), 30).unwrap();
    assert_eq!(saving.tag(), 3);
    assert_eq!(saving.interest_rate(), Some(d("2")));
    assert_eq!(AccountKind::Plain.tag(), 1);
    assert_eq!(AccountKind::Plain.interest_rate(), None);
}

#[test]
fn capitalization_waits_for_a_full_period() {
    let kind = AccountKind::saving(d("3.65"), date("2024-01-01"), 100).unwrap();
    let mut acc = Account::new("Savings", d("1000"), kind);

    assert_eq!(acc.capitalize(date("2024-04-09")).unwrap(), Decimal::ZERO);
    assert_eq!(acc.balance(), d("1000"));
    assert_eq!(acc.kind, kind);

    // 2024-07-19 is 200 days later: two compounding steps of 1%.
    let added = acc.capitalize(date("2024-07-19")).unwrap();
    assert_eq!(added, d("20.10"));
    assert_eq!(acc.balance(), d("1020.10"));
    match acc.kind {
        AccountKind::Saving {
            last_capitalization,
            ..
        } => assert_eq!(last_capitalization, date("2024-07-19")),
        other => panic!("unexpected kind {:?}", other),
    }
    assert_eq!(acc.capitalize(date("2024-07-20")).unwrap(), Decimal::ZERO);
}

#[test]
fn capitalization_ignores_other_kinds() {
    let mut credit = Account::new("Card", d("500"), AccountKind::credit(d("20")).unwrap());
    assert_eq!(credit.capitalize(date("2030-01-01")).unwrap(), Decimal::ZERO);
    assert_eq!(credit.balance(), d("500"));
}

#[test]
fn regular_templates_fire_once_per_elapsed_period() {
    let mut acc = Account::plain("A", d("1000"));
    let mut rent = RegularEntry::new(
        Entry::new("Rent", d("100"), Some(food()), date("2024-01-01")),
        30,
        1,
    );
    rent.entry.id = 5;
    acc.add_regular_expense(rent).unwrap();
    assert_eq!(acc.balance(), d("900"));

    assert!(acc.due_regular_expenses(date("2024-01-30")).is_empty());

    let fired = acc.due_regular_expenses(date("2024-03-01"));
    let dates: Vec<NaiveDate> = fired.iter().map(|(_, e)| e.date).collect();
    assert_eq!(dates, vec![date("2024-01-31"), date("2024-03-01")]);
    assert!(fired.iter().all(|(t, e)| *t == 5 && e.id == 0 && e.name == "Rent"));
    assert_eq!(acc.regular_expenses()[0].last_occurrence, date("2024-03-01"));
    // Collecting does not touch the balance; the caller applies the entries.
    assert_eq!(acc.balance(), d("900"));
}

#[test]
fn regular_income_applies_first_occurrence() {
    let mut acc = Account::plain("A", Decimal::ZERO);
    let salary = RegularEntry::new(
        Entry::new("Salary", d("3000"), None, date("2024-01-25")),
        30,
        1,
    );
    assert!(!salary.is_due(date("2024-02-23")));
    assert!(salary.is_due(date("2024-02-24")));
    acc.add_regular_income(salary).unwrap();
    assert_eq!(acc.balance(), d("3000"));
    assert_eq!(acc.due_regular_incomes(date("2024-02-24")).len(), 1);
    assert!(acc.remove_regular_income(0).is_some());
    assert!(acc.regular_incomes().is_empty());
}

#[test]
fn balance_overflow_is_an_error_not_a_panic() {
    let mut acc = Account::plain("A", Decimal::MAX);
    let income = Entry::new("Salary", d("1"), None, date("2024-03-25"));
    assert!(matches!(
        acc.add_income(income),
        Err(StoreError::Overflow(_))
    ));
    assert_eq!(acc.balance(), Decimal::MAX);
    assert!(acc.incomes().is_empty());

    let mut low = Account::plain("B", Decimal::MIN);
    assert!(matches!(
        low.add_expense(Entry::new("Rent", d("1"), None, date("2024-03-01"))),
        Err(StoreError::Overflow(_))
    ));
    assert!(low.expenses().is_empty());

    let mut target = Account::plain("C", Decimal::MAX);
    let mut source = Account::plain("D", d("10"));
    assert!(source.transfer_money(d("1"), &mut target).is_err());
    assert_eq!(source.balance(), d("10"));
    assert_eq!(target.balance(), Decimal::MAX);
}

#[test]
fn interest_overflow_leaves_account_unchanged() {
    let kind = AccountKind::saving(d("1000000000000000000000"), date("2024-01-01"), 30).unwrap();
    let mut acc = Account::new("Savings", d("1000000"), kind);
    assert!(matches!(
        acc.capitalize(date("2025-01-01")),
        Err(StoreError::Overflow(_))
    ));
    assert_eq!(acc.balance(), d("1000000"));
    assert_eq!(acc.kind, kind);
}

#[test]
fn far_future_template_is_never_due() {
    let t = RegularEntry::new(
        Entry::new("Rent", d("1"), None, NaiveDate::MAX),
        u32::MAX,
        1,
    );
    assert_eq!(t.next_due(), None);
    assert!(!t.is_due(NaiveDate::MAX));
}
