//! Engine behavior under dependency failure and under concurrent
//! load. Filing and alert failures must never erase a completed
//! screening.

use aml_core::config::AmlConfig;
use aml_core::engine::{AmlEngine, ScreeningOutcome};
use aml_core::error::{AmlError, AmlResult};
use aml_core::notifier::{ComplianceNotifier, LogNotifier};
use aml_core::sanctions::SanctionLists;
use aml_core::sar::Sar;
use aml_core::store::{SarStore, SqliteSarStore};
use aml_core::types::{
    AmlFlag, ContactInfo, Customer, PersonalInfo, ScreeningResult, Transaction, TransactionType,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

struct BrokenSarStore;

impl SarStore for BrokenSarStore {
    fn insert(&self, _sar: &Sar) -> AmlResult<()> {
        Err(AmlError::Other(anyhow::anyhow!("disk full")))
    }
    fn get(&self, _sar_id: &str) -> AmlResult<Option<Sar>> {
        Ok(None)
    }
    fn all(&self) -> AmlResult<Vec<Sar>> {
        Ok(Vec::new())
    }
    fn count(&self) -> AmlResult<u64> {
        Ok(0)
    }
}

struct BrokenNotifier;

impl ComplianceNotifier for BrokenNotifier {
    fn send_compliance_alert(&self, _recipient: &str, _subject: &str, _body: &str) -> AmlResult<()> {
        Err(AmlError::AlertDispatch {
            reason: "gateway unreachable".into(),
        })
    }
}

fn lists() -> Arc<SanctionLists> {
    Arc::new(SanctionLists::new(
        ["SANCTIONED PERSON".to_string()],
        Vec::new(),
        Vec::new(),
    ))
}

fn customer(id: &str, first: &str, last: &str) -> Customer {
    Customer {
        customer_id: id.into(),
        personal_info: PersonalInfo {
            first_name: first.into(),
            last_name: last.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1979, 12, 5).expect("valid date"),
            nationality: "US".into(),
            address: "2 Failure Ct".into(),
            contact: ContactInfo {
                email: "f@example.com".into(),
                phone: "555-0106".into(),
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
        txn_type: TransactionType::Deposit,
        description: "resilience test".into(),
        counterparty: None,
        aml_flags: BTreeSet::new(),
        fraud_score: 0.0,
    }
}

fn screened(outcome: ScreeningOutcome) -> ScreeningResult {
    match outcome {
        ScreeningOutcome::Screened(result) => result,
        other => panic!("expected Screened, got {other:?}"),
    }
}

/// A failing SAR store reports sar_id = None on an otherwise complete
/// screening; the flags, score, and counters are all intact.
#[test]
fn sar_store_failure_does_not_fail_screening() {
    let engine = AmlEngine::new(
        AmlConfig::default(),
        lists(),
        Arc::new(BrokenSarStore),
        Arc::new(LogNotifier),
    );
    let cust = customer("CUST-BRK", "Sanctioned", "Person");
    let mut txn = transaction("TXN-BRK", "CUST-BRK", 40.0);

    let result = screened(engine.screen_transaction(&mut txn, &cust));

    assert!(result.suspicious);
    assert!(result.sanction_hit);
    assert_eq!(result.risk_score, 100);
    assert!(result.sar_id.is_none(), "filing failed, screening did not");
    assert!(!result.alert_dispatched, "no SAR means no alert");

    let stats = engine.statistics();
    assert_eq!(stats.total_transactions_screened, 1);
    assert_eq!(stats.flagged_transactions, 1);
    assert_eq!(stats.sars_generated, 0, "failed filings are not counted");
}

/// A failing notifier reports alert_dispatched = false; the SAR is
/// still filed and retrievable.
#[test]
fn alert_failure_still_files_the_sar() {
    let engine = AmlEngine::new(
        AmlConfig::default(),
        lists(),
        Arc::new(SqliteSarStore::in_memory().expect("store")),
        Arc::new(BrokenNotifier),
    );
    let cust = customer("CUST-ALR", "Sanctioned", "Person");
    let mut txn = transaction("TXN-ALR", "CUST-ALR", 40.0);

    let result = screened(engine.screen_transaction(&mut txn, &cust));

    let sar_id = result.sar_id.expect("SAR must still file");
    assert!(!result.alert_dispatched);
    assert!(engine.get_sar(&sar_id).expect("read").is_some());
    assert_eq!(engine.statistics().sars_generated, 1);
}

/// Eight threads hammering one engine: every screening lands in the
/// counters exactly once and per-customer velocity state stays
/// consistent.
#[test]
fn concurrent_screening_keeps_counters_consistent() {
    let engine = Arc::new(AmlEngine::new(
        AmlConfig::default(),
        lists(),
        Arc::new(SqliteSarStore::in_memory().expect("store")),
        Arc::new(LogNotifier),
    ));

    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let engine = Arc::clone(&engine);
        handles.push(std::thread::spawn(move || {
            let cust = customer(&format!("CUST-T{t}"), "Thread", &format!("{t}"));
            for i in 0..PER_THREAD {
                let mut txn =
                    transaction(&format!("TXN-T{t}-{i}"), &cust.customer_id, 25.0);
                match engine.screen_transaction(&mut txn, &cust) {
                    ScreeningOutcome::Screened(_) => {}
                    other => panic!("expected Screened, got {other:?}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("screening thread");
    }

    let stats = engine.statistics();
    assert_eq!(
        stats.total_transactions_screened,
        (THREADS * PER_THREAD) as u64
    );
    // 25 same-customer transactions in one window: everything after
    // the 5 warm-up calls carries RapidTransactions.
    assert_eq!(
        stats.flagged_transactions,
        (THREADS * (PER_THREAD - 5)) as u64
    );
    assert_eq!(stats.sanction_hits, 0);
    assert_eq!(stats.sars_generated, 0, "RapidTransactions is not a critical flag");

    for t in 0..THREADS {
        let retained = engine
            .monitor()
            .retained_count(&format!("CUST-T{t}"))
            .expect("retained");
        assert_eq!(retained, PER_THREAD, "customer {t} window");
    }
}

/// Weight fusion: the score is the max weight across flags, and an
/// unknown-to-the-table flag falls back to the default weight.
#[test]
fn risk_scores_fuse_by_max_weight() {
    let mut config = AmlConfig::default();
    config.risk_weights.weights.remove(&AmlFlag::UnusualPattern);

    let engine = AmlEngine::new(
        config,
        lists(),
        Arc::new(SqliteSarStore::in_memory().expect("store")),
        Arc::new(LogNotifier),
    );
    let cust = customer("CUST-WT", "Wes", "Tan");

    // 6000 round deposit: UnusualPattern only, now scored at the
    // default weight of 20.
    let mut txn = transaction("TXN-WT1", "CUST-WT", 6_000.0);
    let result = screened(engine.screen_transaction(&mut txn, &cust));
    assert_eq!(
        result.flags,
        [AmlFlag::UnusualPattern].into_iter().collect::<BTreeSet<_>>()
    );
    assert_eq!(result.risk_score, 20);

    // 9000 deposit adds Structuring (70), which dominates.
    let mut txn = transaction("TXN-WT2", "CUST-WT", 9_000.0);
    let result = screened(engine.screen_transaction(&mut txn, &cust));
    assert!(result.flags.contains(&AmlFlag::Structuring));
    assert_eq!(result.risk_score, 70);
}
