//! Typed feed events.
//!
//! Raw feed payloads are parsed exactly once, at the ingestor boundary.
//! Everything downstream (queue entries, dispatcher evaluation) works with
//! these shapes; the dispatcher never re-validates JSON.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque key scoping a watch: a price-feed account or a wallet address.
pub type Identifier = CompactString;

/// Error returned when a feed payload does not match the expected shape.
#[derive(Debug, Error)]
#[error("failed to parse {category} event: {source}")]
pub struct ParseError {
    pub category: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Oracle price update as streamed by the feed.
///
/// Field names follow the wire format so a queued event round-trips with its
/// original payload fields intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Price-feed account the update belongs to.
    #[serde(rename = "priceFeedAccount")]
    pub feed_account: Identifier,
    /// Current oracle price.
    pub price: f64,
}

impl PriceUpdate {
    /// Parse a raw feed payload into a price update.
    pub fn from_json(raw: &str) -> Result<Self, ParseError> {
        serde_json::from_str(raw).map_err(|source| ParseError {
            category: "price",
            source,
        })
    }
}

/// Token transfer as streamed by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Mint address of the transferred token.
    #[serde(rename = "mintAddress")]
    pub mint: CompactString,
    /// Sending wallet address.
    #[serde(rename = "senderAddress")]
    pub sender: Identifier,
    /// Receiving wallet address.
    #[serde(rename = "receiverAddress")]
    pub receiver: Identifier,
    /// Transferred amount in token units.
    pub amount: f64,
}

impl TransferEvent {
    /// Parse a raw feed payload into a transfer event.
    pub fn from_json(raw: &str) -> Result<Self, ParseError> {
        serde_json::from_str(raw).map_err(|source| ParseError {
            category: "transfer",
            source,
        })
    }
}

/// Tagged union of the two event shapes a pipeline can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeedEvent {
    Price(PriceUpdate),
    Transfer(TransferEvent),
}

/// Transfer direction relative to a watched identifier.
///
/// Derived once per queue entry by comparing the event's sender to the
/// identifier the entry was queued under, never per watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

impl TransferEvent {
    /// Direction of this transfer as seen from `identifier`.
    pub fn direction_for(&self, identifier: &str) -> Direction {
        if self.sender == identifier {
            Direction::Send
        } else {
            Direction::Receive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_price_update_wire_names() {
        let raw = r#"{"priceFeedAccount":"F1","price":10.4}"#;
        let update = PriceUpdate::from_json(raw).unwrap();
        assert_eq!(update.feed_account, "F1");
        assert_eq!(update.price, 10.4);

        // Wire names survive a round trip through the queue encoding.
        let encoded = serde_json::to_value(&update).unwrap();
        assert_eq!(encoded["priceFeedAccount"], "F1");
        assert_eq!(encoded["price"], 10.4);
    }

    #[test]
    fn test_transfer_event_wire_names() {
        let raw = r#"{"mintAddress":"M","senderAddress":"W1","receiverAddress":"X","amount":150.0}"#;
        let event = TransferEvent::from_json(raw).unwrap();
        assert_eq!(event.mint, "M");
        assert_eq!(event.sender, "W1");
        assert_eq!(event.receiver, "X");
        assert_eq!(event.amount, 150.0);
    }

    #[test]
    fn test_malformed_payload_is_a_parse_error() {
        let err = PriceUpdate::from_json("{\"price\":\"not-a-number\"}").unwrap_err();
        assert_eq!(err.category, "price");
        assert!(TransferEvent::from_json("not json").is_err());
    }

    #[test]
    fn test_direction_fixed_by_queued_identifier() {
        let event = TransferEvent {
            mint: "M".into(),
            sender: "W1".into(),
            receiver: "X".into(),
            amount: 1.0,
        };
        assert_eq!(event.direction_for("W1"), Direction::Send);
        assert_eq!(event.direction_for("X"), Direction::Receive);
    }
}
