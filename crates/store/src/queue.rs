//! Persisted alert queue between ingestor and dispatcher.

use crate::{KvStore, StoreError};
use chrono::{DateTime, Utc};
use sentinel_core::{Identifier, Pipeline};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

/// One queued (identifier, event) pair awaiting filter evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry<E> {
    /// The identifier the ingestor matched against the watch registry.
    pub identifier: Identifier,
    /// The typed event, parsed once at the ingestor boundary.
    pub event: E,
    /// When the ingestor queued the event.
    #[serde(rename = "enqueuedAt")]
    pub enqueued_at: DateTime<Utc>,
}

/// FIFO hand-off backed by a persisted list, one per pipeline.
///
/// The contract allows multiple producers and multiple consumers: a popped
/// entry is removed atomically by the store, so no two consumers can ever
/// receive the same entry. There are no acknowledgements; a consumer crash
/// after a pop loses that entry (at-least-once, by design).
pub struct AlertQueue<E> {
    store: Arc<dyn KvStore>,
    pipeline: Pipeline,
    _event: PhantomData<E>,
}

impl<E> AlertQueue<E>
where
    E: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KvStore>, pipeline: Pipeline) -> Self {
        Self {
            store,
            pipeline,
            _event: PhantomData,
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// Append an event to the tail of the queue.
    ///
    /// Failures propagate to the caller; the ingestor logs them without
    /// tearing down the feed connection.
    pub async fn enqueue(&self, identifier: Identifier, event: E) -> Result<(), StoreError> {
        let entry = QueueEntry {
            identifier,
            event,
            enqueued_at: Utc::now(),
        };
        let raw = serde_json::to_string(&entry).map_err(StoreError::Encode)?;
        self.store.rpush(self.pipeline.queue_key(), &raw).await
    }

    /// Destructively pop the head of the queue; `None` when empty.
    pub async fn dequeue(&self) -> Result<Option<QueueEntry<E>>, StoreError> {
        let key = self.pipeline.queue_key();
        match self.store.lpop(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use pretty_assertions::assert_eq;
    use sentinel_core::PriceUpdate;

    fn queue(store: Arc<MemoryStore>) -> AlertQueue<PriceUpdate> {
        AlertQueue::new(store, Pipeline::Price)
    }

    fn update(feed: &str, price: f64) -> PriceUpdate {
        PriceUpdate {
            feed_account: feed.into(),
            price,
        }
    }

    #[tokio::test]
    async fn test_empty_queue_pops_none() {
        let q = queue(Arc::new(MemoryStore::new()));
        assert_eq!(q.dequeue().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let q = queue(Arc::new(MemoryStore::new()));
        q.enqueue("F1".into(), update("F1", 1.0)).await.unwrap();
        q.enqueue("F2".into(), update("F2", 2.0)).await.unwrap();

        assert_eq!(q.dequeue().await.unwrap().unwrap().identifier, "F1");
        assert_eq!(q.dequeue().await.unwrap().unwrap().identifier, "F2");
        assert_eq!(q.dequeue().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_event_payload_survives_intact() {
        let q = queue(Arc::new(MemoryStore::new()));
        q.enqueue("F1".into(), update("F1", 10.4)).await.unwrap();

        let entry = q.dequeue().await.unwrap().unwrap();
        assert_eq!(entry.event, update("F1", 10.4));
    }

    #[tokio::test]
    async fn test_pop_is_destructive() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(store.clone());
        q.enqueue("F1".into(), update("F1", 1.0)).await.unwrap();

        assert!(q.dequeue().await.unwrap().is_some());
        assert_eq!(store.list_len(Pipeline::Price.queue_key()), 0);
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_are_kept() {
        let q = queue(Arc::new(MemoryStore::new()));
        q.enqueue("F1".into(), update("F1", 1.0)).await.unwrap();
        q.enqueue("F1".into(), update("F1", 2.0)).await.unwrap();

        assert_eq!(q.dequeue().await.unwrap().unwrap().event.price, 1.0);
        assert_eq!(q.dequeue().await.unwrap().unwrap().event.price, 2.0);
    }
}
