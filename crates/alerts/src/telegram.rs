//! Telegram notification sink and alert message formatting.

use crate::{AlertError, NotificationSink};
use async_trait::async_trait;
use sentinel_core::{Direction, PriceUpdate, PriceWatch, TransferEvent};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

/// Telegram-backed notification sink.
///
/// Delivery is best-effort: a non-2xx response surfaces as an error to the
/// dispatcher, which logs it and moves on.
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    /// Create a sink with the given bot token.
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, user_id: i64, text: &str) -> Result<(), AlertError> {
        self.bot
            .send_message(ChatId(user_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        debug!(user_id, "Notification delivered");
        Ok(())
    }
}

/// Price formatting with precision scaled to magnitude, so sub-cent feeds
/// stay readable without drowning large prices in decimals.
fn format_price(price: f64) -> String {
    if price == 0.0 {
        return "$0".to_string();
    }
    let decimals = match price.abs() {
        p if p >= 1000.0 => 2,
        p if p >= 1.0 => 4,
        p if p >= 0.01 => 6,
        _ => 8,
    };
    format!("${:.*}", decimals, price)
}

/// Format a token amount, trimming to a sane precision.
fn format_amount(amount: f64) -> String {
    if amount >= 1000.0 {
        format!("{:.2}", amount)
    } else {
        format!("{:.4}", amount)
    }
}

/// Render a price alert message.
pub fn format_price_alert(watch: &PriceWatch, update: &PriceUpdate) -> String {
    let now = chrono::Utc::now();
    format!(
        "\u{1F514} <b>Price Alert!</b>\n\n\
         <b>{}</b> reached {}\n\
         Target: {}\n\n\
         \u{23F0} {}",
        watch.name,
        format_price(update.price),
        format_price(watch.price),
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Render a whale transfer alert message.
pub fn format_transfer_alert(
    event: &TransferEvent,
    direction: Direction,
    identifier: &str,
) -> String {
    let verb = match direction {
        Direction::Send => "sent",
        Direction::Receive => "received",
    };
    let now = chrono::Utc::now();
    format!(
        "\u{1F40B} <b>Whale Alert!</b>\n\n\
         <code>{}</code> {} {} of <code>{}</code>\n\
         From: <code>{}</code>\n\
         To: <code>{}</code>\n\n\
         \u{23F0} {}",
        identifier,
        verb,
        format_amount(event.amount),
        event.mint,
        event.sender,
        event.receiver,
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}
