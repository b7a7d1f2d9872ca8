//! Error types for feed operations.

use sentinel_core::ParseError;
use sentinel_store::StoreError;
use thiserror::Error;

/// Errors that can occur while ingesting the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    #[error("WebSocket disconnected: {0}")]
    Disconnected(String),

    #[error("failed to parse event: {0}")]
    Parse(#[from] ParseError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("enqueue timed out after {0:?}")]
    EnqueueTimeout(std::time::Duration),

    #[error("reconnect attempts exhausted after {0}")]
    RetriesExhausted(u32),
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::ConnectionFailed(err.to_string())
    }
}

impl From<url::ParseError> for FeedError {
    fn from(err: url::ParseError) -> Self {
        FeedError::ConnectionFailed(err.to_string())
    }
}
