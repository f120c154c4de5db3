//! Per-customer sliding-window velocity monitor.
//!
//! RULES:
//!   - The count-then-append sequence for one customer is atomic:
//!     each customer's window sits behind its own mutex, so two
//!     concurrent transactions for the same customer cannot both
//!     observe a stale count and slip under the velocity threshold.
//!   - Different customers never contend beyond the brief registry
//!     lookup.
//!   - Windows are bounded: every append prunes entries older than
//!     2 × the rapid-transaction window.

use crate::{
    clock::Clock,
    error::{AmlError, AmlResult},
    types::{AmlFlag, Customer, CustomerId, MonitorResult, Transaction, TransactionId},
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct HistoryEntry {
    transaction_id: TransactionId,
    amount: f64,
    observed_at: DateTime<Utc>,
}

/// One customer's recent-transaction window, ordered by observation
/// time (appends only ever happen at the back).
#[derive(Debug, Default)]
struct CustomerWindow {
    entries: VecDeque<HistoryEntry>,
}

pub struct TransactionMonitor {
    windows: Mutex<HashMap<CustomerId, Arc<Mutex<CustomerWindow>>>>,
    suspicious_amount_threshold: f64,
    rapid_window: Duration,
    rapid_threshold: usize,
}

impl TransactionMonitor {
    pub fn new(
        suspicious_amount_threshold: f64,
        rapid_window_secs: u64,
        rapid_threshold: usize,
    ) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            suspicious_amount_threshold,
            rapid_window: Duration::seconds(rapid_window_secs as i64),
            rapid_threshold,
        }
    }

    /// Evaluate one transaction against the customer's history as it
    /// stood before this call, then record the transaction.
    pub fn monitor(
        &self,
        transaction: &Transaction,
        customer: &Customer,
        clock: &dyn Clock,
    ) -> AmlResult<MonitorResult> {
        let window = self.window_for(&customer.customer_id)?;
        let mut window = window.lock().map_err(|_| AmlError::HistoryLockPoisoned {
            customer_id: customer.customer_id.clone(),
        })?;

        let now = clock.now();
        let mut flags = BTreeSet::new();

        if transaction.amount >= self.suspicious_amount_threshold {
            flags.insert(AmlFlag::LargeAmount);
        }

        // Count against history BEFORE the current transaction lands.
        let window_start = now - self.rapid_window;
        let recent_transaction_count = window
            .entries
            .iter()
            .filter(|e| e.observed_at > window_start)
            .count();
        if recent_transaction_count >= self.rapid_threshold {
            flags.insert(AmlFlag::RapidTransactions);
        }

        window.entries.push_back(HistoryEntry {
            transaction_id: transaction.transaction_id.clone(),
            amount: transaction.amount,
            observed_at: now,
        });

        let retain_after = now - self.rapid_window * 2;
        while window
            .entries
            .front()
            .is_some_and(|e| e.observed_at < retain_after)
        {
            window.entries.pop_front();
        }

        if !flags.is_empty() {
            log::debug!(
                "monitor: txn={} customer={} amount={:.2} recent={} flags={:?}",
                transaction.transaction_id,
                customer.customer_id,
                transaction.amount,
                recent_transaction_count,
                flags
            );
        }

        Ok(MonitorResult {
            suspicious: !flags.is_empty(),
            flags,
            recent_transaction_count,
        })
    }

    /// Number of history entries currently retained for a customer.
    /// Exposed for tests and ops tooling.
    pub fn retained_count(&self, customer_id: &str) -> AmlResult<usize> {
        let registry = self
            .windows
            .lock()
            .map_err(|_| AmlError::HistoryLockPoisoned {
                customer_id: customer_id.to_string(),
            })?;
        match registry.get(customer_id) {
            Some(window) => {
                let window = window.lock().map_err(|_| AmlError::HistoryLockPoisoned {
                    customer_id: customer_id.to_string(),
                })?;
                Ok(window.entries.len())
            }
            None => Ok(0),
        }
    }

    /// Ordered snapshot of a customer's retained window: transaction
    /// id, amount, and observation time. Used by investigation
    /// tooling and the pruning tests.
    pub fn window_snapshot(
        &self,
        customer_id: &str,
    ) -> AmlResult<Vec<(TransactionId, f64, DateTime<Utc>)>> {
        let registry = self
            .windows
            .lock()
            .map_err(|_| AmlError::HistoryLockPoisoned {
                customer_id: customer_id.to_string(),
            })?;
        match registry.get(customer_id) {
            Some(window) => {
                let window = window.lock().map_err(|_| AmlError::HistoryLockPoisoned {
                    customer_id: customer_id.to_string(),
                })?;
                Ok(window
                    .entries
                    .iter()
                    .map(|e| (e.transaction_id.clone(), e.amount, e.observed_at))
                    .collect())
            }
            None => Ok(Vec::new()),
        }
    }

    fn window_for(&self, customer_id: &str) -> AmlResult<Arc<Mutex<CustomerWindow>>> {
        let mut registry = self
            .windows
            .lock()
            .map_err(|_| AmlError::HistoryLockPoisoned {
                customer_id: customer_id.to_string(),
            })?;
        Ok(registry
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CustomerWindow::default())))
            .clone())
    }
}
