//! Per-pipeline predicate and rendering, the seam that lets one dispatcher
//! drive both pipelines.

use crate::telegram::{format_price_alert, format_transfer_alert};
use sentinel_core::{PriceUpdate, PriceWatch, TransferEvent, TransferWatch, Watch};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Filter evaluation and message rendering for one watcher kind.
///
/// `identifier` is the key the entry was queued under; the transfer rule
/// derives its direction from it, once per entry, never per watcher.
pub trait AlertRule: Watch {
    type Event: Serialize + DeserializeOwned + Send + Sync;

    fn is_match(&self, event: &Self::Event, identifier: &str) -> bool;

    fn render(&self, event: &Self::Event, identifier: &str) -> String;
}

impl AlertRule for PriceWatch {
    type Event = PriceUpdate;

    fn is_match(&self, event: &PriceUpdate, _identifier: &str) -> bool {
        self.matches(event)
    }

    fn render(&self, event: &PriceUpdate, _identifier: &str) -> String {
        format_price_alert(self, event)
    }
}

impl AlertRule for TransferWatch {
    type Event = TransferEvent;

    fn is_match(&self, event: &TransferEvent, identifier: &str) -> bool {
        self.matches(event, event.direction_for(identifier))
    }

    fn render(&self, event: &TransferEvent, identifier: &str) -> String {
        format_transfer_alert(event, event.direction_for(identifier), identifier)
    }
}
