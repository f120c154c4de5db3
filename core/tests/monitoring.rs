//! Sliding-window velocity monitoring: counting order, window edges,
//! pruning, and per-customer isolation. Time is driven by hand.

use aml_core::clock::ManualClock;
use aml_core::monitor::TransactionMonitor;
use aml_core::types::{
    AmlFlag, ContactInfo, Customer, PersonalInfo, Transaction, TransactionType,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::collections::BTreeSet;

fn customer(id: &str) -> Customer {
    Customer {
        customer_id: id.into(),
        personal_info: PersonalInfo {
            first_name: "Mona".into(),
            last_name: "Tse".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 9, 9).expect("valid date"),
            nationality: "US".into(),
            address: "4 Window Way".into(),
            contact: ContactInfo {
                email: "m@example.com".into(),
                phone: "555-0102".into(),
            },
        },
    }
}

fn transaction(id: &str, customer_id: &str, amount: f64) -> Transaction {
    Transaction {
        transaction_id: id.into(),
        customer_id: customer_id.into(),
        amount,
        currency: "USD".into(),
        txn_type: TransactionType::Payment,
        description: "velocity test".into(),
        counterparty: None,
        aml_flags: BTreeSet::new(),
        fraud_score: 0.0,
    }
}

fn start_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single().expect("valid time"))
}

/// With threshold 3, the count of PRIOR transactions in the window is
/// what fires: the 3rd call sees 2 and stays quiet, the 4th sees 3
/// and flags.
#[test]
fn rapid_flag_counts_history_before_append() {
    let monitor = TransactionMonitor::new(10_000.0, 3600, 3);
    let clock = start_clock();
    let cust = customer("CUST-V");

    for i in 1..=3 {
        let txn = transaction(&format!("TXN-V{i}"), "CUST-V", 10.0);
        let result = monitor.monitor(&txn, &cust, &clock).expect("monitor");
        assert_eq!(result.recent_transaction_count, i - 1);
        assert!(
            !result.flags.contains(&AmlFlag::RapidTransactions),
            "call {i} sees only {} prior entries",
            i - 1
        );
        clock.advance(Duration::seconds(60));
    }

    let txn = transaction("TXN-V4", "CUST-V", 10.0);
    let result = monitor.monitor(&txn, &cust, &clock).expect("monitor");
    assert_eq!(result.recent_transaction_count, 3);
    assert!(result.flags.contains(&AmlFlag::RapidTransactions));
    assert!(result.suspicious);
}

/// Entries aged past the window stop counting; the flag clears once
/// the burst falls out of scope.
#[test]
fn old_entries_leave_the_window() {
    let monitor = TransactionMonitor::new(10_000.0, 3600, 2);
    let clock = start_clock();
    let cust = customer("CUST-W");

    for i in 1..=2 {
        let txn = transaction(&format!("TXN-W{i}"), "CUST-W", 10.0);
        monitor.monitor(&txn, &cust, &clock).expect("monitor");
    }

    // Both prior entries still inside the hour: flag fires.
    let txn = transaction("TXN-W3", "CUST-W", 10.0);
    let result = monitor.monitor(&txn, &cust, &clock).expect("monitor");
    assert!(result.flags.contains(&AmlFlag::RapidTransactions));

    // 61 minutes later everything before is stale.
    clock.advance(Duration::minutes(61));
    let txn = transaction("TXN-W4", "CUST-W", 10.0);
    let result = monitor.monitor(&txn, &cust, &clock).expect("monitor");
    assert_eq!(result.recent_transaction_count, 0);
    assert!(!result.flags.contains(&AmlFlag::RapidTransactions));
}

/// Appends prune anything older than twice the window, so a quiet
/// customer's history cannot grow without bound.
#[test]
fn history_is_pruned_beyond_twice_the_window() {
    let monitor = TransactionMonitor::new(10_000.0, 3600, 5);
    let clock = start_clock();
    let cust = customer("CUST-X");

    for i in 1..=4 {
        let txn = transaction(&format!("TXN-X{i}"), "CUST-X", 10.0);
        monitor.monitor(&txn, &cust, &clock).expect("monitor");
        clock.advance(Duration::minutes(10));
    }
    assert_eq!(monitor.retained_count("CUST-X").expect("count"), 4);

    // Jump past 2 x 3600s; the next append drops all four old entries.
    clock.advance(Duration::hours(3));
    let txn = transaction("TXN-X5", "CUST-X", 10.0);
    monitor.monitor(&txn, &cust, &clock).expect("monitor");

    let snapshot = monitor.window_snapshot("CUST-X").expect("snapshot");
    assert_eq!(snapshot.len(), 1, "only the fresh entry survives: {snapshot:?}");
    assert_eq!(snapshot[0].0, "TXN-X5");
    assert_eq!(snapshot[0].1, 10.0);
}

/// One customer's burst never bleeds into another's window.
#[test]
fn windows_are_per_customer() {
    let monitor = TransactionMonitor::new(10_000.0, 3600, 2);
    let clock = start_clock();
    let busy = customer("CUST-BUSY");
    let quiet = customer("CUST-QUIET");

    for i in 1..=3 {
        let txn = transaction(&format!("TXN-B{i}"), "CUST-BUSY", 10.0);
        monitor.monitor(&txn, &busy, &clock).expect("monitor");
    }

    let txn = transaction("TXN-Q1", "CUST-QUIET", 10.0);
    let result = monitor.monitor(&txn, &quiet, &clock).expect("monitor");
    assert_eq!(result.recent_transaction_count, 0);
    assert!(!result.suspicious);
    assert_eq!(monitor.retained_count("CUST-QUIET").expect("count"), 1);
}

/// LargeAmount is inclusive at the threshold.
#[test]
fn large_amount_threshold_is_inclusive() {
    let monitor = TransactionMonitor::new(10_000.0, 3600, 5);
    let clock = start_clock();
    let cust = customer("CUST-Y");

    let txn = transaction("TXN-Y1", "CUST-Y", 9_999.99);
    let result = monitor.monitor(&txn, &cust, &clock).expect("monitor");
    assert!(!result.flags.contains(&AmlFlag::LargeAmount));

    let txn = transaction("TXN-Y2", "CUST-Y", 10_000.0);
    let result = monitor.monitor(&txn, &cust, &clock).expect("monitor");
    assert!(result.flags.contains(&AmlFlag::LargeAmount));
    assert!(result.suspicious);
}

/// A customer with no history reads back as empty, not an error.
#[test]
fn unknown_customer_has_empty_window() {
    let monitor = TransactionMonitor::new(10_000.0, 3600, 5);
    assert_eq!(monitor.retained_count("CUST-NONE").expect("count"), 0);
    assert!(monitor.window_snapshot("CUST-NONE").expect("snapshot").is_empty());
}
