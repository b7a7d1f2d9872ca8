//! Pipeline identities and their well-known store keys.

use serde::{Deserialize, Serialize};

/// The two parallel alert pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pipeline {
    /// Oracle price alerts keyed by price-feed account.
    Price,
    /// Whale transfer alerts keyed by wallet address.
    Transfer,
}

impl Pipeline {
    /// Store key of the watcher document for this pipeline.
    ///
    /// One JSON object per pipeline mapping identifier -> array of watchers,
    /// read and written whole by every component that touches it.
    pub fn watch_doc_key(&self) -> &'static str {
        match self {
            Pipeline::Price => "sentinel:watchers:price",
            Pipeline::Transfer => "sentinel:watchers:transfer",
        }
    }

    /// Store key of the persisted alert queue for this pipeline.
    pub fn queue_key(&self) -> &'static str {
        match self {
            Pipeline::Price => "sentinel:queue:price",
            Pipeline::Transfer => "sentinel:queue:transfer",
        }
    }

    /// Event category declared in the feed's configure message.
    pub fn feed_category(&self) -> &'static str {
        match self {
            Pipeline::Price => "oraclePrices",
            Pipeline::Transfer => "transfers",
        }
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pipeline::Price => write!(f, "price"),
            Pipeline::Transfer => write!(f, "transfer"),
        }
    }
}
