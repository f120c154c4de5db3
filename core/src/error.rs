use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmlError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SAR '{sar_id}' not found")]
    SarNotFound { sar_id: String },

    #[error("Customer history lock poisoned for '{customer_id}'")]
    HistoryLockPoisoned { customer_id: String },

    #[error("Alert dispatch failed: {reason}")]
    AlertDispatch { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AmlResult<T> = Result<T, AmlError>;
