//! Per-pipeline event handling: parse once, test membership, enqueue.

use crate::{FeedError, WatchRegistry};
use async_trait::async_trait;
use sentinel_core::{Pipeline, PriceUpdate, TransferEvent};
use sentinel_store::AlertQueue;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Default upper bound on a single enqueue call, so a wedged store cannot
/// stall the socket read loop indefinitely.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(2);

/// Pipeline-specific handling of one raw feed payload.
///
/// Implementations parse the payload into the pipeline's event shape, test
/// the event's key against the watch registry, and enqueue on a hit. Errors
/// are reported to the caller for logging; they never terminate the
/// connection.
#[async_trait]
pub trait IngestHandler: Send + Sync {
    fn pipeline(&self) -> Pipeline;

    async fn handle_message(&self, raw: &str) -> Result<(), FeedError>;
}

async fn enqueue_bounded<E>(
    queue: &AlertQueue<E>,
    identifier: sentinel_core::Identifier,
    event: E,
    timeout: Duration,
) -> Result<(), FeedError>
where
    E: serde::Serialize + serde::de::DeserializeOwned + Send,
{
    match tokio::time::timeout(timeout, queue.enqueue(identifier, event)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(FeedError::EnqueueTimeout(timeout)),
    }
}

/// Oracle price pipeline: events are keyed by their price-feed account.
pub struct PriceIngestor {
    registry: Arc<WatchRegistry>,
    queue: AlertQueue<PriceUpdate>,
    enqueue_timeout: Duration,
}

impl PriceIngestor {
    pub fn new(registry: Arc<WatchRegistry>, queue: AlertQueue<PriceUpdate>) -> Self {
        Self {
            registry,
            queue,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }

    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }
}

#[async_trait]
impl IngestHandler for PriceIngestor {
    fn pipeline(&self) -> Pipeline {
        Pipeline::Price
    }

    async fn handle_message(&self, raw: &str) -> Result<(), FeedError> {
        let update = PriceUpdate::from_json(raw)?;
        if !self.registry.contains(&update.feed_account) {
            trace!(feed = %update.feed_account, "Unwatched price feed, dropping");
            return Ok(());
        }

        let identifier = update.feed_account.clone();
        enqueue_bounded(&self.queue, identifier, update, self.enqueue_timeout).await
    }
}

/// Whale transfer pipeline: events may queue under the sender or the
/// receiver, whichever appears in the registry. Sender is checked first and
/// a single event never queues under both.
pub struct TransferIngestor {
    registry: Arc<WatchRegistry>,
    queue: AlertQueue<TransferEvent>,
    enqueue_timeout: Duration,
}

impl TransferIngestor {
    pub fn new(registry: Arc<WatchRegistry>, queue: AlertQueue<TransferEvent>) -> Self {
        Self {
            registry,
            queue,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }

    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }
}

#[async_trait]
impl IngestHandler for TransferIngestor {
    fn pipeline(&self) -> Pipeline {
        Pipeline::Transfer
    }

    async fn handle_message(&self, raw: &str) -> Result<(), FeedError> {
        let event = TransferEvent::from_json(raw)?;

        let identifier = if self.registry.contains(&event.sender) {
            event.sender.clone()
        } else if self.registry.contains(&event.receiver) {
            event.receiver.clone()
        } else {
            trace!(sender = %event.sender, receiver = %event.receiver, "Unwatched transfer, dropping");
            return Ok(());
        };

        enqueue_bounded(&self.queue, identifier, event, self.enqueue_timeout).await
    }
}
