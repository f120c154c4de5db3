//! Screening configuration and the risk-weight policy.
//!
//! Defaults match the compliance-approved baseline; production runs
//! load overrides from a JSON file. Weight tables are versioned
//! because they change under compliance sign-off, not engineering.

use crate::types::AmlFlag;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flags that force a SAR filing and a compliance alert whenever the
/// transaction is suspicious.
pub const CRITICAL_FLAGS: [AmlFlag; 3] = [
    AmlFlag::SanctionHit,
    AmlFlag::Structuring,
    AmlFlag::HighRiskCountry,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmlConfig {
    /// Master switch. When off, screen_transaction() is a no-op.
    pub screening_enabled: bool,
    /// Single-amount threshold for LargeAmount; also anchors the
    /// structuring band [0.9×threshold, threshold).
    pub suspicious_amount_threshold: f64,
    /// Sliding-window length for velocity detection, in seconds.
    pub rapid_transaction_window_secs: u64,
    /// History entries inside the window before RapidTransactions fires.
    pub rapid_transaction_threshold: usize,
    /// Recipient handed to the compliance notifier.
    pub alert_recipient: String,
    pub risk_weights: RiskWeightPolicy,
}

impl Default for AmlConfig {
    fn default() -> Self {
        Self {
            screening_enabled: true,
            suspicious_amount_threshold: 10_000.0,
            rapid_transaction_window_secs: 3600,
            rapid_transaction_threshold: 5,
            alert_recipient: "compliance-desk@bank.internal".into(),
            risk_weights: RiskWeightPolicy::default(),
        }
    }
}

impl AmlConfig {
    /// Load overrides from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AmlConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

/// Versioned flag-to-weight table. The risk score of a screened
/// transaction is the maximum weight among its flags, clamped to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeightPolicy {
    pub version: String,
    pub weights: HashMap<AmlFlag, u8>,
    /// Applied to any flag missing from the table.
    pub default_weight: u8,
}

impl Default for RiskWeightPolicy {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            weights: [
                (AmlFlag::SanctionHit, 100),
                (AmlFlag::HighRiskCountry, 80),
                (AmlFlag::Structuring, 70),
                (AmlFlag::LargeAmount, 50),
                (AmlFlag::RapidTransactions, 40),
                (AmlFlag::UnusualPattern, 30),
            ]
            .into(),
            default_weight: 20,
        }
    }
}

impl RiskWeightPolicy {
    pub fn weight(&self, flag: AmlFlag) -> u8 {
        self.weights.get(&flag).copied().unwrap_or(self.default_weight)
    }

    /// Max-weight fusion over a flag set, clamped to 100.
    pub fn score<'a, I: IntoIterator<Item = &'a AmlFlag>>(&self, flags: I) -> u8 {
        flags
            .into_iter()
            .map(|f| self.weight(*f))
            .max()
            .unwrap_or(0)
            .min(100)
    }
}
