//! Periodically refreshed membership set of watched identifiers.
//!
//! The ingestor only needs a fast membership test per inbound event; the
//! full filter objects stay in the persisted document and are re-read by the
//! dispatcher at evaluation time. An identifier added by the chat UI becomes
//! visible here on the next refresh tick - bounded eventual consistency.

use sentinel_core::Watch;
use sentinel_store::{StoreError, WatchStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// In-memory set of identifiers currently worth queuing events for.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    set: RwLock<HashSet<String>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.set.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.set.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Membership test used on every inbound event.
    pub fn contains(&self, identifier: &str) -> bool {
        self.read().contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Rebuild the set from the persisted watcher document.
    ///
    /// The new set is swapped in wholesale, so concurrent readers see either
    /// the old set or the new one, never a partial rebuild. An absent
    /// document is a no-op that keeps the prior set intact.
    pub async fn refresh<W>(&self, watches: &WatchStore<W>) -> Result<(), StoreError>
    where
        W: Watch + Serialize + DeserializeOwned + Clone,
    {
        let Some(doc) = watches.try_load_all().await? else {
            debug!(
                pipeline = %watches.pipeline(),
                "Watcher document absent, keeping previous registry"
            );
            return Ok(());
        };

        let next: HashSet<String> = doc.into_keys().map(Into::into).collect();
        debug!(
            pipeline = %watches.pipeline(),
            watched = next.len(),
            "Refreshed watch registry"
        );
        *self.write() = next;
        Ok(())
    }
}

/// Refresh `registry` from the store on a fixed interval until cancelled.
///
/// Refresh failures are logged and the previous set stays in effect until
/// the next tick succeeds.
pub async fn run_refresh<W>(
    registry: Arc<WatchRegistry>,
    watches: Arc<WatchStore<W>>,
    interval: Duration,
    cancel: CancellationToken,
) where
    W: Watch + Serialize + DeserializeOwned + Clone,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(pipeline = %watches.pipeline(), "Registry refresh stopped");
                return;
            }
            _ = ticker.tick() => {
                if let Err(e) = registry.refresh(&watches).await {
                    warn!(pipeline = %watches.pipeline(), error = %e, "Registry refresh failed");
                }
            }
        }
    }
}
