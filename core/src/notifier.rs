//! Compliance alert dispatch boundary.
//!
//! The real delivery stack (channels, templating, retry/backoff)
//! lives outside this crate. The engine treats dispatch as
//! fire-and-forget: a failed send is reported on the screening result
//! and logged, never escalated into a screening failure.

use crate::error::AmlResult;

pub trait ComplianceNotifier: Send + Sync {
    fn send_compliance_alert(&self, recipient: &str, subject: &str, body: &str) -> AmlResult<()>;
}

/// Default notifier: writes the alert to the log. Suitable for the
/// runner and for deployments where delivery is wired in later.
pub struct LogNotifier;

impl ComplianceNotifier for LogNotifier {
    fn send_compliance_alert(&self, recipient: &str, subject: &str, body: &str) -> AmlResult<()> {
        log::info!("compliance alert to {recipient}: {subject} | {body}");
        Ok(())
    }
}
