//! aml-core: the AML transaction screening engine.
//!
//! RULES:
//!   - The engine is a library: callers hand it validated Transaction
//!     and Customer values, it hands back a ScreeningOutcome. No I/O
//!     except SAR persistence and the injected alert dispatch.
//!   - Only store.rs talks to the database.
//!   - All timestamps flow through the Clock trait.
//!   - screen_transaction() never returns Err to the caller.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod notifier;
pub mod patterns;
pub mod sanctions;
pub mod sar;
pub mod store;
pub mod types;

pub use engine::{AmlEngine, EngineStatistics, ScreeningOutcome};
pub use error::{AmlError, AmlResult};
pub use types::{AmlFlag, Customer, ScreeningResult, Transaction, TransactionType};
