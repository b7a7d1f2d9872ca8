//! Core data types for the sentinel alert pipelines.

pub mod event;
pub mod pipeline;
pub mod watch;

pub use event::*;
pub use pipeline::*;
pub use watch::*;
