//! Time source for the screening core.
//!
//! RULE: Nothing in the core calls Utc::now() directly. All
//! timestamps flow through a Clock so the sliding-window tests can
//! advance time by hand.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The production default.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually-advanced clock for tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward. Panics on a poisoned lock, which only
    /// happens if a test already panicked while holding it.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock lock");
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().expect("manual clock lock");
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("manual clock lock")
    }
}
