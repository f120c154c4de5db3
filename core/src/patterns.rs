//! Stateless single-transaction pattern heuristics.

use crate::types::{AmlFlag, Customer, PatternResult, Transaction, TransactionType};
use std::collections::BTreeSet;

/// Round amounts at or above this look staged; withdrawals above it
/// are unusual regardless of roundness.
const UNUSUAL_AMOUNT_FLOOR: f64 = 5_000.0;

pub struct PatternDetector {
    suspicious_amount_threshold: f64,
}

impl PatternDetector {
    pub fn new(suspicious_amount_threshold: f64) -> Self {
        Self {
            suspicious_amount_threshold,
        }
    }

    /// Pure function of the single transaction, no history.
    pub fn detect(&self, transaction: &Transaction, _customer: &Customer) -> PatternResult {
        let mut flags = BTreeSet::new();
        let amount = transaction.amount;

        // Structuring band: just under the reporting threshold.
        let band_floor = self.suspicious_amount_threshold * 0.9;
        if amount >= band_floor && amount < self.suspicious_amount_threshold {
            flags.insert(AmlFlag::Structuring);
        }

        let round_thousand = amount % 1_000.0 == 0.0;
        let large_withdrawal = transaction.txn_type == TransactionType::Withdrawal
            && amount > UNUSUAL_AMOUNT_FLOOR;
        if (round_thousand && amount >= UNUSUAL_AMOUNT_FLOOR) || large_withdrawal {
            flags.insert(AmlFlag::UnusualPattern);
        }

        PatternResult {
            suspicious: !flags.is_empty(),
            flags,
        }
    }
}
