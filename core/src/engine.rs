//! The screening engine: orchestrates the three screeners, fuses
//! their flags into a risk score, and decides on SAR filing and
//! compliance alerting.
//!
//! RULES:
//!   - screen_transaction() never returns Err: screener failures come
//!     back as ScreeningOutcome::Failed with any partial flags
//!     discarded.
//!   - SAR-store and alert failures never erase a completed
//!     screening; they surface as sar_id=None / alert_dispatched=false.
//!   - All methods take &self and are safe to call from multiple
//!     threads; counters are atomic, history is serialized per
//!     customer inside the monitor.

use crate::{
    clock::{Clock, SystemClock},
    config::{AmlConfig, CRITICAL_FLAGS},
    error::AmlResult,
    monitor::TransactionMonitor,
    notifier::ComplianceNotifier,
    patterns::PatternDetector,
    sanctions::{NameMatcher, SanctionLists, SanctionScreener},
    sar::{Sar, SarGenerator},
    store::SarStore,
    types::{AmlFlag, Customer, ScreeningResult, Transaction, TransactionId},
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What the caller gets back for one screening call. Never an Err:
/// a caller decides its own default-deny or default-escalate policy
/// on Failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScreeningOutcome {
    /// Screening is disabled by configuration; nothing was evaluated
    /// or recorded.
    Skipped { transaction_id: TransactionId },
    Screened(ScreeningResult),
    /// A screener failed; partial flags were discarded.
    Failed {
        transaction_id: TransactionId,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineStatistics {
    pub total_transactions_screened: u64,
    pub flagged_transactions: u64,
    pub sars_generated: u64,
    pub sanction_hits: u64,
    /// flagged / screened, 0.0 before anything is screened.
    pub flag_rate: f64,
}

#[derive(Default)]
struct EngineMetrics {
    total_screened: AtomicU64,
    flagged: AtomicU64,
    sars_generated: AtomicU64,
    sanction_hits: AtomicU64,
}

pub struct AmlEngine {
    config: AmlConfig,
    screener: SanctionScreener,
    monitor: TransactionMonitor,
    detector: PatternDetector,
    sar_generator: SarGenerator,
    notifier: Arc<dyn ComplianceNotifier>,
    clock: Arc<dyn Clock>,
    metrics: EngineMetrics,
}

impl AmlEngine {
    pub fn new(
        config: AmlConfig,
        lists: Arc<SanctionLists>,
        sar_store: Arc<dyn SarStore>,
        notifier: Arc<dyn ComplianceNotifier>,
    ) -> Self {
        let monitor = TransactionMonitor::new(
            config.suspicious_amount_threshold,
            config.rapid_transaction_window_secs,
            config.rapid_transaction_threshold,
        );
        let detector = PatternDetector::new(config.suspicious_amount_threshold);
        Self {
            screener: SanctionScreener::new(lists),
            monitor,
            detector,
            sar_generator: SarGenerator::new(sar_store),
            notifier,
            clock: Arc::new(SystemClock),
            metrics: EngineMetrics::default(),
            config,
        }
    }

    /// Replace the wall clock. Used by tests driving the sliding
    /// window by hand.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Substitute a stricter sanctions matcher. The orchestration is
    /// unaware of matching semantics.
    pub fn with_name_matcher(mut self, matcher: Arc<dyn NameMatcher>) -> Self {
        self.screener = self.screener.with_matcher(matcher);
        self
    }

    /// Screen one transaction against the three detectors, appending
    /// any flags to the transaction itself.
    pub fn screen_transaction(
        &self,
        transaction: &mut Transaction,
        customer: &Customer,
    ) -> ScreeningOutcome {
        if !self.config.screening_enabled {
            return ScreeningOutcome::Skipped {
                transaction_id: transaction.transaction_id.clone(),
            };
        }

        match self.run_screening(transaction, customer) {
            Ok(result) => ScreeningOutcome::Screened(result),
            Err(e) => {
                log::error!(
                    "screening failed: txn={} customer={}: {e}",
                    transaction.transaction_id,
                    customer.customer_id
                );
                ScreeningOutcome::Failed {
                    transaction_id: transaction.transaction_id.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    fn run_screening(
        &self,
        transaction: &mut Transaction,
        customer: &Customer,
    ) -> AmlResult<ScreeningResult> {
        // The three evaluations are independent of each other; the
        // monitor is the only one that touches state.
        let sanction = self
            .screener
            .screen(transaction, customer, self.clock.as_ref());
        let monitored = self.monitor.monitor(transaction, customer, self.clock.as_ref())?;
        let patterns = self.detector.detect(transaction, customer);

        let mut flags: BTreeSet<AmlFlag> = BTreeSet::new();
        flags.extend(&sanction.flags);
        flags.extend(&monitored.flags);
        flags.extend(&patterns.flags);

        let suspicious = sanction.hit || monitored.suspicious || patterns.suspicious;

        // Idempotent append: the set skips flags already present.
        for flag in &flags {
            transaction.aml_flags.insert(*flag);
        }

        let risk_score = self.config.risk_weights.score(&flags);

        let mut sar_id = None;
        let mut alert_dispatched = false;
        if suspicious && flags.iter().any(|f| CRITICAL_FLAGS.contains(f)) {
            match self
                .sar_generator
                .generate(transaction, customer, &flags, self.clock.as_ref())
            {
                Ok(sar) => {
                    self.metrics.sars_generated.fetch_add(1, Ordering::Relaxed);
                    alert_dispatched = self.dispatch_alert(&sar, risk_score);
                    sar_id = Some(sar.sar_id);
                }
                Err(e) => {
                    // Screening itself completed; report the filing
                    // gap on the result instead of failing the call.
                    log::error!(
                        "SAR filing failed: txn={} customer={}: {e}",
                        transaction.transaction_id,
                        customer.customer_id
                    );
                }
            }
        }

        self.metrics.total_screened.fetch_add(1, Ordering::Relaxed);
        if suspicious {
            self.metrics.flagged.fetch_add(1, Ordering::Relaxed);
            log::info!(
                "flagged: txn={} customer={} score={} flags={:?}",
                transaction.transaction_id,
                customer.customer_id,
                risk_score,
                flags
            );
        }
        if sanction.hit {
            self.metrics.sanction_hits.fetch_add(1, Ordering::Relaxed);
        }

        Ok(ScreeningResult {
            transaction_id: transaction.transaction_id.clone(),
            suspicious,
            flags,
            risk_score,
            sanction_hit: sanction.hit,
            requires_review: suspicious,
            sar_id,
            alert_dispatched,
        })
    }

    /// Fire-and-forget alert. Returns whether dispatch succeeded.
    fn dispatch_alert(&self, sar: &Sar, risk_score: u8) -> bool {
        let subject = format!("AML alert: transaction {}", sar.transaction_id);
        let body = format!("risk score {}: {}", risk_score, sar.description);
        match self
            .notifier
            .send_compliance_alert(&self.config.alert_recipient, &subject, &body)
        {
            Ok(()) => true,
            Err(e) => {
                log::warn!("alert dispatch failed for {}: {e}", sar.sar_id);
                false
            }
        }
    }

    pub fn get_sar(&self, sar_id: &str) -> AmlResult<Option<Sar>> {
        self.sar_generator.get_sar(sar_id)
    }

    pub fn all_sars(&self) -> AmlResult<Vec<Sar>> {
        self.sar_generator.all_sars()
    }

    /// Read-only view of the monitor, for tests and ops tooling.
    pub fn monitor(&self) -> &TransactionMonitor {
        &self.monitor
    }

    pub fn statistics(&self) -> EngineStatistics {
        let total = self.metrics.total_screened.load(Ordering::Relaxed);
        let flagged = self.metrics.flagged.load(Ordering::Relaxed);
        EngineStatistics {
            total_transactions_screened: total,
            flagged_transactions: flagged,
            sars_generated: self.metrics.sars_generated.load(Ordering::Relaxed),
            sanction_hits: self.metrics.sanction_hits.load(Ordering::Relaxed),
            flag_rate: if total > 0 {
                flagged as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}
