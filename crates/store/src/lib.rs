//! Persisted-store layer for the alert pipelines.
//!
//! This crate provides:
//! - `KvStore` - the narrow string/list contract every component talks to
//! - `RedisStore` - the production implementation
//! - `MemoryStore` - an in-memory fake with the same contract, for tests
//! - `WatchStore` - keyed access to the per-pipeline watcher documents
//! - `AlertQueue` - the persisted FIFO hand-off between ingestor and dispatcher

pub mod error;
pub mod kv;
pub mod queue;
pub mod redis_store;
pub mod watch_store;

pub use error::StoreError;
pub use kv::{KvStore, MemoryStore};
pub use queue::{AlertQueue, QueueEntry};
pub use redis_store::RedisStore;
pub use watch_store::{WatchLimit, WatchStore};
