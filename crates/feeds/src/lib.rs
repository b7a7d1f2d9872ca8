//! Feed ingestion for the alert pipelines.
//!
//! This crate maintains one streaming connection per pipeline to the
//! external market-data feed, filters inbound events against the watch
//! registry, and hands matches to the persisted alert queue.
//!
//! ## Architecture
//!
//! - `client` - WebSocket connection state machine with timed reconnect
//! - `ingest` - per-pipeline event parsing and membership filtering
//! - `registry` - periodically refreshed membership set of watched keys

pub mod client;
pub mod error;
pub mod ingest;
pub mod registry;

pub use client::{configure_message, ConnState, FeedClient, FeedConfig, ReconnectPolicy};
pub use error::FeedError;
pub use ingest::{IngestHandler, PriceIngestor, TransferIngestor};
pub use registry::{run_refresh, WatchRegistry};
