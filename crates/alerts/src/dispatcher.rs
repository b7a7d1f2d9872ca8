//! The queue-draining dispatch loop.

use crate::{AlertRule, NotificationSink};
use sentinel_store::{AlertQueue, QueueEntry, WatchStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default sleep between polls when the queue is empty, and after a store
/// failure.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Single sequential consumer loop for one pipeline's alert queue.
///
/// Multiple dispatcher instances may safely run against the same queue:
/// the destructive pop guarantees no two instances receive the same entry,
/// at the cost of cross-instance ordering.
pub struct Dispatcher<W: AlertRule> {
    queue: AlertQueue<W::Event>,
    watches: Arc<WatchStore<W>>,
    sink: Arc<dyn NotificationSink>,
    poll_interval: Duration,
}

impl<W> Dispatcher<W>
where
    W: AlertRule + Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(
        queue: AlertQueue<W::Event>,
        watches: Arc<WatchStore<W>>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            queue,
            watches,
            sink,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Drain the queue until cancelled.
    ///
    /// An empty queue and a store failure both pause for the poll interval;
    /// nothing terminates the loop except the token.
    pub async fn run(self, cancel: CancellationToken) {
        let pipeline = self.queue.pipeline();
        info!(%pipeline, "Dispatcher started");

        loop {
            if cancel.is_cancelled() {
                info!(%pipeline, "Dispatcher stopped");
                return;
            }

            let pause = match self.queue.dequeue().await {
                Ok(Some(entry)) => {
                    self.process_entry(entry).await;
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    warn!(%pipeline, error = %e, "Failed to pop alert queue");
                    true
                }
            };

            if pause {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }
    }

    /// Evaluate one queue entry against the current watcher list.
    ///
    /// The watcher document is re-read from the store on every entry so
    /// edits made after the event was queued are honored. A send failure for
    /// one watcher never prevents evaluation of the rest.
    pub async fn process_entry(&self, entry: QueueEntry<W::Event>) {
        let pipeline = self.queue.pipeline();

        let watchers = match self.watches.watchers_for(&entry.identifier).await {
            Ok(watchers) => watchers,
            Err(e) => {
                // The entry was already popped; it is lost. At-least-once
                // delivery, not exactly-once.
                error!(%pipeline, identifier = %entry.identifier, error = %e,
                       "Failed to read watchers, entry discarded");
                return;
            }
        };

        if watchers.is_empty() {
            debug!(%pipeline, identifier = %entry.identifier,
                   "No watchers left for identifier, entry discarded");
            return;
        }

        for watch in &watchers {
            if !watch.is_match(&entry.event, &entry.identifier) {
                continue;
            }

            let text = watch.render(&entry.event, &entry.identifier);
            match self.sink.send(watch.user_id(), &text).await {
                Ok(()) => {
                    info!(%pipeline, user_id = watch.user_id(),
                          identifier = %entry.identifier, "Alert sent");
                }
                Err(e) => {
                    error!(%pipeline, user_id = watch.user_id(), error = %e,
                           "Failed to send alert");
                }
            }
        }
    }
}
