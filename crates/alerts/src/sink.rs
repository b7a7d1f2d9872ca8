//! Outbound notification seam.

use crate::AlertError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Best-effort delivery of a rendered alert to a chat user.
///
/// Failures are caller-visible and only ever logged by the dispatcher;
/// nothing in the pipeline retries a send.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, user_id: i64, text: &str) -> Result<(), AlertError>;
}

/// In-memory sink that records every send, optionally failing for chosen
/// users. Used by dispatcher tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(i64, String)>>,
    fail_for: Mutex<HashSet<i64>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `user_id` fail.
    pub fn fail_for(&self, user_id: i64) {
        self.fail_for
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id);
    }

    /// Everything successfully sent so far, in order.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, user_id: i64, text: &str) -> Result<(), AlertError> {
        let failing = self
            .fail_for
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&user_id);
        if failing {
            return Err(AlertError::Rejected(format!(
                "simulated failure for user {user_id}"
            )));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((user_id, text.to_string()));
        Ok(())
    }
}
