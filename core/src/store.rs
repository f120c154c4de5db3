//! SQLite persistence for Suspicious Activity Reports.
//!
//! RULE: Only store.rs talks to the database. The generator and
//! engine go through the SarStore trait, so a different backend can
//! be injected at construction.

use crate::{
    error::{AmlError, AmlResult},
    sar::{Sar, SarMetadata, SarStatus},
    types::{AmlFlag, TransactionType},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Append-only SAR storage. Implementations must never mutate or
/// delete a stored report.
pub trait SarStore: Send + Sync {
    fn insert(&self, sar: &Sar) -> AmlResult<()>;
    fn get(&self, sar_id: &str) -> AmlResult<Option<Sar>>;
    fn all(&self) -> AmlResult<Vec<Sar>>;
    fn count(&self) -> AmlResult<u64>;
}

pub struct SqliteSarStore {
    conn: Mutex<Connection>,
}

impl SqliteSarStore {
    pub fn open(path: &str) -> AmlResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AmlResult<Self> {
        let conn = Connection::open(":memory:")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> AmlResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(include_str!("../../migrations/001_sars.sql"))?;
        Ok(())
    }

    fn lock(&self) -> AmlResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AmlError::Other(anyhow::anyhow!("SAR store connection lock poisoned")))
    }
}

impl SarStore for SqliteSarStore {
    fn insert(&self, sar: &Sar) -> AmlResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sar
             (sar_id, transaction_id, customer_id, customer_name, amount, currency,
              transaction_type, flags, description, filing_date, status,
              counterparty, transaction_description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                sar.sar_id,
                sar.transaction_id,
                sar.customer_id,
                sar.customer_name,
                sar.amount,
                sar.currency,
                sar.transaction_type.label(),
                serde_json::to_string(&sar.flags)?,
                sar.description,
                sar.filing_date.to_rfc3339(),
                "filed",
                sar.metadata.counterparty,
                sar.metadata.transaction_description,
            ],
        )?;
        Ok(())
    }

    fn get(&self, sar_id: &str) -> AmlResult<Option<Sar>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sar_id, transaction_id, customer_id, customer_name, amount, currency,
                    transaction_type, flags, description, filing_date,
                    counterparty, transaction_description
             FROM sar WHERE sar_id = ?1",
        )?;
        let sar = stmt
            .query_row(params![sar_id], row_to_sar)
            .optional()?;
        Ok(sar)
    }

    fn all(&self) -> AmlResult<Vec<Sar>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sar_id, transaction_id, customer_id, customer_name, amount, currency,
                    transaction_type, flags, description, filing_date,
                    counterparty, transaction_description
             FROM sar ORDER BY rowid ASC",
        )?;
        let sars = stmt
            .query_map([], row_to_sar)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sars)
    }

    fn count(&self) -> AmlResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sar", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn row_to_sar(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sar> {
    let type_label: String = row.get(6)?;
    let flags_json: String = row.get(7)?;
    let filing_date: String = row.get(9)?;

    let flags: BTreeSet<AmlFlag> = serde_json::from_str(&flags_json)
        .map_err(|e| conversion_error(7, e))?;
    let filing_date = DateTime::parse_from_rfc3339(&filing_date)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(9, e))?;

    Ok(Sar {
        sar_id: row.get(0)?,
        transaction_id: row.get(1)?,
        customer_id: row.get(2)?,
        customer_name: row.get(3)?,
        amount: row.get(4)?,
        currency: row.get(5)?,
        transaction_type: parse_type(&type_label),
        flags,
        description: row.get(8)?,
        filing_date,
        status: SarStatus::Filed,
        metadata: SarMetadata {
            counterparty: row.get(10)?,
            transaction_description: row.get(11)?,
        },
    })
}

fn conversion_error(
    column: usize,
    source: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(source),
    )
}

fn parse_type(label: &str) -> TransactionType {
    match label {
        "deposit" => TransactionType::Deposit,
        "withdrawal" => TransactionType::Withdrawal,
        "transfer" => TransactionType::Transfer,
        "payment" => TransactionType::Payment,
        _ => TransactionType::Fee,
    }
}
