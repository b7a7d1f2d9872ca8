//! Alert dispatch for the sentinel pipelines.
//!
//! This crate provides:
//! - `Dispatcher` - the polling loop that drains a pipeline's alert queue
//!   and evaluates every current watcher against each entry
//! - `NotificationSink` - the outbound seam, with a Telegram implementation
//!   and an in-memory recording fake for tests
//! - `AlertRule` - per-watch predicate and rendering, one impl per pipeline

pub mod dispatcher;
pub mod error;
pub mod rule;
pub mod sink;
pub mod telegram;

pub use dispatcher::Dispatcher;
pub use error::AlertError;
pub use rule::AlertRule;
pub use sink::{NotificationSink, RecordingSink};
pub use telegram::{format_price_alert, format_transfer_alert, TelegramSink};
