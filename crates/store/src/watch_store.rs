//! Keyed access to the per-pipeline watcher documents.
//!
//! Each pipeline persists all of its watchers in a single JSON document
//! mapping identifier -> array of watcher objects. That external shape is
//! shared with the chat UI layer and must not change; this module hides the
//! whole-document read-modify-write behind get/put operations keyed by
//! identifier.

use crate::{KvStore, StoreError};
use sentinel_core::{Identifier, Pipeline, Watch};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Scope of the per-user watcher cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchLimit {
    /// At most N watchers per user on each identifier (transfer pipeline).
    PerIdentifier(usize),
    /// At most N watchers per user across the whole pipeline (price pipeline).
    Global(usize),
}

/// Watcher document accessor for one pipeline.
///
/// Every read goes to the store; nothing is cached here. The dispatcher
/// relies on that to pick up watcher edits made between enqueue and
/// evaluation.
pub struct WatchStore<W> {
    store: Arc<dyn KvStore>,
    pipeline: Pipeline,
    limit: WatchLimit,
    _watch: PhantomData<W>,
}

impl<W> WatchStore<W>
where
    W: Watch + Serialize + DeserializeOwned + Clone,
{
    pub fn new(store: Arc<dyn KvStore>, pipeline: Pipeline, limit: WatchLimit) -> Self {
        Self {
            store,
            pipeline,
            limit,
            _watch: PhantomData,
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// Read the whole watcher document, or `None` when it has never been
    /// written. The registry refresh needs the distinction: an absent
    /// document leaves its prior membership set intact, an empty one
    /// replaces it.
    pub async fn try_load_all(&self) -> Result<Option<HashMap<Identifier, Vec<W>>>, StoreError> {
        let key = self.pipeline.watch_doc_key();
        match self.store.get_str(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Read the whole watcher document. An absent document is an empty map,
    /// not an error.
    pub async fn load_all(&self) -> Result<HashMap<Identifier, Vec<W>>, StoreError> {
        Ok(self.try_load_all().await?.unwrap_or_default())
    }

    /// Identifiers currently carrying at least one watcher.
    pub async fn identifiers(&self) -> Result<Vec<Identifier>, StoreError> {
        Ok(self.load_all().await?.into_keys().collect())
    }

    /// Current watcher list for one identifier, read fresh from the store.
    pub async fn watchers_for(&self, identifier: &str) -> Result<Vec<W>, StoreError> {
        Ok(self
            .load_all()
            .await?
            .remove(identifier)
            .unwrap_or_default())
    }

    /// Replace the watcher list for one identifier. An empty list drops the
    /// identifier from the document entirely so the registry refresh stops
    /// seeing it.
    pub async fn put_watchers(&self, identifier: &str, watchers: Vec<W>) -> Result<(), StoreError> {
        let mut doc = self.load_all().await?;
        if watchers.is_empty() {
            doc.remove(identifier);
        } else {
            doc.insert(Identifier::from(identifier), watchers);
        }
        self.write_doc(&doc).await
    }

    /// Append a watcher, enforcing the pipeline's per-user cap.
    pub async fn add_watch(&self, identifier: &str, watch: W) -> Result<(), StoreError> {
        let mut doc = self.load_all().await?;
        let user_id = watch.user_id();

        let (held, max) = match self.limit {
            WatchLimit::PerIdentifier(max) => {
                let held = doc
                    .get(identifier)
                    .map(|list| list.iter().filter(|w| w.user_id() == user_id).count())
                    .unwrap_or(0);
                (held, max)
            }
            WatchLimit::Global(max) => {
                let held = doc
                    .values()
                    .flatten()
                    .filter(|w| w.user_id() == user_id)
                    .count();
                (held, max)
            }
        };
        if held >= max {
            return Err(StoreError::WatchLimitExceeded { user_id, max });
        }

        doc.entry(Identifier::from(identifier)).or_default().push(watch);
        self.write_doc(&doc).await
    }

    async fn write_doc(&self, doc: &HashMap<Identifier, Vec<W>>) -> Result<(), StoreError> {
        let raw = serde_json::to_string(doc).map_err(StoreError::Encode)?;
        self.store
            .set_str(self.pipeline.watch_doc_key(), &raw)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use pretty_assertions::assert_eq;
    use sentinel_core::{PriceWatch, TransferWatch};

    fn price_store(store: Arc<MemoryStore>, max: usize) -> WatchStore<PriceWatch> {
        WatchStore::new(store, Pipeline::Price, WatchLimit::Global(max))
    }

    fn transfer_store(store: Arc<MemoryStore>) -> WatchStore<TransferWatch> {
        WatchStore::new(store, Pipeline::Transfer, WatchLimit::PerIdentifier(3))
    }

    fn price_watch(user_id: i64) -> PriceWatch {
        PriceWatch {
            user_id,
            price: 10.0,
            active: true,
            name: "SOL".to_string(),
        }
    }

    fn transfer_watch(user_id: i64) -> TransferWatch {
        TransferWatch {
            user_id,
            send: true,
            receive: true,
            mint: None,
            amount: None,
            greater: true,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_absent_document_reads_as_empty() {
        let watches = price_store(Arc::new(MemoryStore::new()), 10);
        assert!(watches.load_all().await.unwrap().is_empty());
        assert!(watches.watchers_for("F1").await.unwrap().is_empty());
        assert!(watches.identifiers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_read_back() {
        let watches = price_store(Arc::new(MemoryStore::new()), 10);
        watches.add_watch("F1", price_watch(42)).await.unwrap();
        watches.add_watch("F2", price_watch(7)).await.unwrap();

        let listed = watches.watchers_for("F1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id, 42);

        let mut ids = watches.identifiers().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["F1", "F2"]);
    }

    #[tokio::test]
    async fn test_global_limit_spans_identifiers() {
        let watches = price_store(Arc::new(MemoryStore::new()), 2);
        watches.add_watch("F1", price_watch(42)).await.unwrap();
        watches.add_watch("F2", price_watch(42)).await.unwrap();

        let err = watches.add_watch("F3", price_watch(42)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::WatchLimitExceeded { user_id: 42, max: 2 }
        ));

        // Other users are unaffected.
        watches.add_watch("F3", price_watch(7)).await.unwrap();
    }

    #[tokio::test]
    async fn test_per_identifier_limit() {
        let watches = transfer_store(Arc::new(MemoryStore::new()));
        for _ in 0..3 {
            watches.add_watch("W1", transfer_watch(7)).await.unwrap();
        }
        assert!(watches.add_watch("W1", transfer_watch(7)).await.is_err());

        // Same user on a different address is still allowed.
        watches.add_watch("W2", transfer_watch(7)).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_list_drops_identifier() {
        let watches = transfer_store(Arc::new(MemoryStore::new()));
        watches.add_watch("W1", transfer_watch(7)).await.unwrap();
        watches.put_watchers("W1", Vec::new()).await.unwrap();
        assert!(watches.identifiers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_shape_is_identifier_to_array() {
        let store = Arc::new(MemoryStore::new());
        let watches = transfer_store(store.clone());
        watches.add_watch("W1", transfer_watch(7)).await.unwrap();

        let raw = store
            .get_str(Pipeline::Transfer.watch_doc_key())
            .await
            .unwrap()
            .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(doc["W1"].is_array());
        assert_eq!(doc["W1"][0]["userId"], 7);
    }
}
