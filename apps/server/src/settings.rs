//! Process settings, sourced from the environment.

use sentinel_core::{DEFAULT_MAX_PRICE_WATCHES_PER_USER, MAX_TRANSFER_WATCHES_PER_USER};
use sentinel_feeds::ReconnectPolicy;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Everything the process needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Store connection URL.
    pub redis_url: String,
    /// Telegram bot token for the notification sink.
    pub telegram_token: String,
    /// Market-data feed websocket URL.
    pub feed_ws_url: String,
    /// Watch registry refresh interval.
    pub refresh_interval: Duration,
    /// Feed reconnect policy (fixed delay, optional attempt cap).
    pub reconnect: ReconnectPolicy,
    /// Dispatcher sleep when its queue is empty.
    pub poll_interval: Duration,
    /// Global per-user cap on price watchers.
    pub max_price_watches: usize,
    /// Per-address per-user cap on transfer watchers.
    pub max_transfer_watches: usize,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    /// Resolve settings from the environment. Only the Telegram token is
    /// required; everything else has a production default.
    pub fn from_env() -> Result<Self, SettingsError> {
        let telegram_token = std::env::var("SENTINEL_TELEGRAM_TOKEN")
            .map_err(|_| SettingsError::Missing("SENTINEL_TELEGRAM_TOKEN"))?;

        let max_attempts = std::env::var("SENTINEL_RECONNECT_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok());

        Ok(Self {
            redis_url: env_or("SENTINEL_REDIS_URL", "redis://127.0.0.1:6379/"),
            telegram_token,
            feed_ws_url: env_or("SENTINEL_FEED_WS_URL", "wss://feed.example.com/live"),
            refresh_interval: Duration::from_secs(env_parse("SENTINEL_REFRESH_INTERVAL_SECS", 30)),
            reconnect: ReconnectPolicy {
                delay: Duration::from_millis(env_parse("SENTINEL_RECONNECT_DELAY_MS", 5_000)),
                max_attempts,
            },
            poll_interval: Duration::from_millis(env_parse("SENTINEL_POLL_INTERVAL_MS", 1_000)),
            max_price_watches: env_parse(
                "SENTINEL_MAX_PRICE_WATCHES",
                DEFAULT_MAX_PRICE_WATCHES_PER_USER,
            ),
            max_transfer_watches: MAX_TRANSFER_WATCHES_PER_USER,
        })
    }
}
