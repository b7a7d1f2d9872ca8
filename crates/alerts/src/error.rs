//! Error types for alert dispatch.

use sentinel_store::StoreError;
use thiserror::Error;

/// Errors that can occur while dispatching alerts.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("notification rejected: {0}")]
    Rejected(String),
}
