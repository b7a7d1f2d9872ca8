//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur when talking to the persisted store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store command failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode document at {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("user {user_id} already holds the maximum of {max} watchers")]
    WatchLimitExceeded { user_id: i64, max: usize },
}
