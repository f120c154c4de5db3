//! Shared domain types for the screening core.
//!
//! Transaction and Customer arrive already validated from the
//! upstream processing layer; nothing here re-checks them. The only
//! field the core mutates is Transaction::aml_flags.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable identifier for a transaction.
pub type TransactionId = String;

/// Stable identifier for a customer.
pub type CustomerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Fee,
}

impl TransactionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
            Self::Payment => "payment",
            Self::Fee => "fee",
        }
    }
}

/// The closed set of AML flags a transaction can carry.
///
/// Ordering is part of the contract: flag sets are BTreeSets and SAR
/// narratives list flags in this declaration order, which keeps every
/// derived artifact reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmlFlag {
    SanctionHit,
    HighRiskCountry,
    Structuring,
    LargeAmount,
    RapidTransactions,
    UnusualPattern,
}

impl AmlFlag {
    /// Fixed narrative phrase used in SAR descriptions.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::SanctionHit => "party matched a sanctions list entry",
            Self::HighRiskCountry => "customer nationality is a high-risk jurisdiction",
            Self::Structuring => "amount falls just under the reporting threshold",
            Self::LargeAmount => "single amount at or above the large-amount threshold",
            Self::RapidTransactions => "burst of rapid transactions within the monitoring window",
            Self::UnusualPattern => "transaction shape is unusual for its type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub customer_id: CustomerId,
    /// Positive amount in the transaction currency.
    pub amount: f64,
    /// ISO 4217 currency code.
    pub currency: String,
    pub txn_type: TransactionType,
    pub description: String,
    pub counterparty: Option<Counterparty>,
    /// Flags appended by the screening core. Deduplicated by the set.
    #[serde(default)]
    pub aml_flags: BTreeSet<AmlFlag>,
    #[serde(default)]
    pub fraud_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    /// ISO 3166-1 alpha-2 country code.
    pub nationality: String,
    pub address: String,
    pub contact: ContactInfo,
}

/// Read-only input to the screening core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub personal_info: PersonalInfo,
}

impl Customer {
    /// "FIRST LAST", uppercased: the form screened against lists.
    pub fn screening_name(&self) -> String {
        format!(
            "{} {}",
            self.personal_info.first_name, self.personal_info.last_name
        )
        .to_uppercase()
    }
}

/// What the engine hands back for one screened transaction.
///
/// Invariants: risk_score <= 100; requires_review == suspicious.
/// sar_id and alert_dispatched report the filing/notification steps
/// independently of screening success, so a SAR-store or dispatch
/// failure never masks a completed screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub transaction_id: TransactionId,
    pub suspicious: bool,
    pub flags: BTreeSet<AmlFlag>,
    pub risk_score: u8,
    pub sanction_hit: bool,
    pub requires_review: bool,
    pub sar_id: Option<String>,
    pub alert_dispatched: bool,
}

/// Result of the sanctions screen for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanctionScreening {
    pub hit: bool,
    pub flags: BTreeSet<AmlFlag>,
    pub screened_at: DateTime<Utc>,
}

/// Result of the sliding-window monitor for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorResult {
    pub suspicious: bool,
    pub flags: BTreeSet<AmlFlag>,
    /// History entries inside the rapid-transaction window at screen
    /// time, not counting the transaction being screened.
    pub recent_transaction_count: usize,
}

/// Result of the stateless pattern heuristics for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub suspicious: bool,
    pub flags: BTreeSet<AmlFlag>,
}
