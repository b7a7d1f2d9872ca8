//! Watcher subscriptions and their filter predicates.

use crate::{Direction, PriceUpdate, TransferEvent};
use serde::{Deserialize, Serialize};

/// Maximum transfer watchers one user may hold on a single address.
pub const MAX_TRANSFER_WATCHES_PER_USER: usize = 3;

/// Default global maximum of price watchers per user.
pub const DEFAULT_MAX_PRICE_WATCHES_PER_USER: usize = 10;

/// Common accessor over both watcher kinds, used by the store layer to
/// enforce per-user limits without knowing the concrete filter shape.
pub trait Watch {
    fn user_id(&self) -> i64;
}

/// One user's price alert subscription on a price feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceWatch {
    /// Chat user id to notify on a match.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Target price: the lower bound of the alert window.
    pub price: f64,
    /// Inactive watchers never match.
    pub active: bool,
    /// Display name shown in the alert message.
    pub name: String,
}

impl PriceWatch {
    /// True when `current` falls in the alert window `[price, price + 1)`.
    ///
    /// The window is a half-open, fixed-width band above the target:
    /// inclusive lower bound, exclusive upper bound, width exactly one unit.
    /// This matches the observed behavior of the deployed system and must
    /// not be replaced with a symmetric tolerance.
    pub fn matches(&self, update: &PriceUpdate) -> bool {
        self.active && update.price >= self.price && update.price < self.price + 1.0
    }
}

/// One user's transfer alert subscription on a wallet address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferWatch {
    /// Chat user id to notify on a match.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Alert on transfers sent by the watched address.
    pub send: bool,
    /// Alert on transfers received by the watched address.
    pub receive: bool,
    /// Restrict to a single token mint when set.
    #[serde(rename = "mintAddress", skip_serializing_if = "Option::is_none")]
    pub mint: Option<String>,
    /// Amount threshold; unset means any amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Comparison mode for `amount`: strictly greater-than when true,
    /// less-or-equal otherwise.
    pub greater: bool,
    /// Inactive watchers never match.
    pub active: bool,
}

impl Watch for PriceWatch {
    fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl Watch for TransferWatch {
    fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl TransferWatch {
    /// Evaluate this filter against a transfer seen in `direction`.
    pub fn matches(&self, event: &TransferEvent, direction: Direction) -> bool {
        if !self.active {
            return false;
        }

        match direction {
            Direction::Send if !self.send => return false,
            Direction::Receive if !self.receive => return false,
            _ => {}
        }

        if let Some(mint) = &self.mint {
            if *mint != event.mint {
                return false;
            }
        }

        if let Some(threshold) = self.amount {
            let hit = if self.greater {
                event.amount > threshold
            } else {
                event.amount <= threshold
            };
            if !hit {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_watch(target: f64) -> PriceWatch {
        PriceWatch {
            user_id: 42,
            price: target,
            active: true,
            name: "SOL".to_string(),
        }
    }

    fn update(price: f64) -> PriceUpdate {
        PriceUpdate {
            feed_account: "F1".into(),
            price,
        }
    }

    fn transfer(amount: f64) -> TransferEvent {
        TransferEvent {
            mint: "M".into(),
            sender: "W1".into(),
            receiver: "X".into(),
            amount,
        }
    }

    fn transfer_watch() -> TransferWatch {
        TransferWatch {
            user_id: 7,
            send: true,
            receive: false,
            mint: None,
            amount: None,
            greater: true,
            active: true,
        }
    }

    #[test]
    fn test_price_window_boundaries() {
        let watch = price_watch(10.0);
        assert!(watch.matches(&update(10.0)), "lower bound is inclusive");
        assert!(watch.matches(&update(10.4)));
        assert!(watch.matches(&update(10.9999)));
        assert!(!watch.matches(&update(11.0)), "upper bound is exclusive");
        assert!(!watch.matches(&update(9.9999)));
    }

    #[test]
    fn test_inactive_price_watch_never_matches() {
        let mut watch = price_watch(10.0);
        watch.active = false;
        assert!(!watch.matches(&update(10.0)));
    }

    #[test]
    fn test_transfer_direction_flags() {
        let watch = transfer_watch();
        assert!(watch.matches(&transfer(1.0), Direction::Send));
        assert!(!watch.matches(&transfer(1.0), Direction::Receive));

        let mut receive_only = transfer_watch();
        receive_only.send = false;
        receive_only.receive = true;
        assert!(!receive_only.matches(&transfer(1.0), Direction::Send));
        assert!(receive_only.matches(&transfer(1.0), Direction::Receive));
    }

    #[test]
    fn test_transfer_mint_restriction_is_exact() {
        let mut watch = transfer_watch();
        watch.mint = Some("M".to_string());
        assert!(watch.matches(&transfer(1.0), Direction::Send));

        watch.mint = Some("OTHER".to_string());
        assert!(!watch.matches(&transfer(1.0), Direction::Send));
    }

    #[test]
    fn test_transfer_amount_comparisons() {
        let mut watch = transfer_watch();
        watch.amount = Some(100.0);

        // greater: strict
        watch.greater = true;
        assert!(watch.matches(&transfer(150.0), Direction::Send));
        assert!(!watch.matches(&transfer(100.0), Direction::Send));

        // less-or-equal: non-strict
        watch.greater = false;
        assert!(watch.matches(&transfer(100.0), Direction::Send));
        assert!(watch.matches(&transfer(50.0), Direction::Send));
        assert!(!watch.matches(&transfer(150.0), Direction::Send));
    }

    #[test]
    fn test_inactive_transfer_watch_never_matches() {
        let mut watch = transfer_watch();
        watch.active = false;
        assert!(!watch.matches(&transfer(1.0), Direction::Send));
    }

    #[test]
    fn test_watch_documents_round_trip() {
        let watch = TransferWatch {
            mint: Some("M".to_string()),
            amount: Some(100.0),
            ..transfer_watch()
        };
        let json = serde_json::to_string(&watch).unwrap();
        assert!(json.contains("\"userId\":7"));
        assert!(json.contains("\"mintAddress\":\"M\""));
        let parsed: TransferWatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, watch);
    }
}
