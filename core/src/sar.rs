//! Suspicious Activity Report generation.
//!
//! A SAR is an audit artifact: immutable once created, retrievable by
//! id, and its description must be byte-for-byte reproducible from
//! the flags and transaction/customer data alone. Timestamps live
//! only in filing_date, never in the description text.

use crate::{
    clock::Clock,
    error::AmlResult,
    store::SarStore,
    types::{AmlFlag, Customer, CustomerId, Transaction, TransactionId, TransactionType},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SarStatus {
    /// The only status this core produces.
    Filed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarMetadata {
    pub counterparty: Option<String>,
    pub transaction_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sar {
    pub sar_id: String,
    pub transaction_id: TransactionId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub amount: f64,
    pub currency: String,
    pub transaction_type: TransactionType,
    pub flags: BTreeSet<AmlFlag>,
    pub description: String,
    pub filing_date: DateTime<Utc>,
    pub status: SarStatus,
    pub metadata: SarMetadata,
}

pub struct SarGenerator {
    store: Arc<dyn SarStore>,
}

impl SarGenerator {
    pub fn new(store: Arc<dyn SarStore>) -> Self {
        Self { store }
    }

    /// Build and persist a SAR for a qualifying transaction. Always
    /// succeeds given valid inputs and a healthy store; the sar_id is
    /// freshly generated and never reused.
    pub fn generate(
        &self,
        transaction: &Transaction,
        customer: &Customer,
        flags: &BTreeSet<AmlFlag>,
        clock: &dyn Clock,
    ) -> AmlResult<Sar> {
        let sar = Sar {
            sar_id: format!("SAR-{}", Uuid::new_v4()),
            transaction_id: transaction.transaction_id.clone(),
            customer_id: customer.customer_id.clone(),
            customer_name: format!(
                "{} {}",
                customer.personal_info.first_name, customer.personal_info.last_name
            ),
            amount: transaction.amount,
            currency: transaction.currency.clone(),
            transaction_type: transaction.txn_type,
            flags: flags.clone(),
            description: compose_description(transaction, customer, flags),
            filing_date: clock.now(),
            status: SarStatus::Filed,
            metadata: SarMetadata {
                counterparty: transaction.counterparty.as_ref().map(|c| c.name.clone()),
                transaction_description: transaction.description.clone(),
            },
        };

        self.store.insert(&sar)?;
        log::info!(
            "SAR filed: {} txn={} customer={} flags={:?}",
            sar.sar_id,
            sar.transaction_id,
            sar.customer_id,
            sar.flags
        );
        Ok(sar)
    }

    pub fn get_sar(&self, sar_id: &str) -> AmlResult<Option<Sar>> {
        self.store.get(sar_id)
    }

    pub fn all_sars(&self) -> AmlResult<Vec<Sar>> {
        self.store.all()
    }
}

/// Deterministic narrative: fixed phrase per flag, flags in enum
/// order, amounts to two decimals. No timestamps.
fn compose_description(
    transaction: &Transaction,
    customer: &Customer,
    flags: &BTreeSet<AmlFlag>,
) -> String {
    let reasons: Vec<&str> = flags.iter().map(AmlFlag::phrase).collect();
    format!(
        "Suspicious activity on transaction {} ({} {:.2} {}) for customer {}: {}.",
        transaction.transaction_id,
        transaction.currency,
        transaction.amount,
        transaction.txn_type.label(),
        customer.customer_id,
        reasons.join("; ")
    )
}
