//! WebSocket client for the market-data feed.
//!
//! One client per pipeline. The connection walks
//! `Disconnected -> Connecting -> Configuring -> Streaming` and falls back
//! to `Closed` or `Errored`, after which the sole recovery mechanism is an
//! unconditional timed reconnect: no backoff, no circuit breaker, and by
//! default no retry cap. Feed availability is assumed eventually restored.

use crate::{FeedError, IngestHandler};
use futures_util::{SinkExt, StreamExt};
use sentinel_core::Pipeline;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Configuring,
    Streaming,
    Closed,
    Errored,
}

impl std::fmt::Display for ConnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnState::Disconnected => "disconnected",
            ConnState::Connecting => "connecting",
            ConnState::Configuring => "configuring",
            ConnState::Streaming => "streaming",
            ConnState::Closed => "closed",
            ConnState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Reconnect policy: fixed delay, optionally bounded attempts.
///
/// The deployed behavior is retry-forever with a fixed 5s delay. Both knobs
/// are exposed so bounded retry is a configuration change rather than a
/// state-machine change.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    /// `None` retries forever. `Some(n)` gives up after the n-th reconnect.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

/// Connection settings for one pipeline's feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ws_url: String,
    pub reconnect: ReconnectPolicy,
}

impl FeedConfig {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Control message declaring interest in a pipeline's event category.
///
/// The filter list is deliberately empty: no server-side filtering is
/// requested, every event is received and tested client-side against the
/// watch registry.
pub fn configure_message(pipeline: Pipeline) -> String {
    serde_json::json!({
        "type": "configure",
        "filters": { pipeline.feed_category(): [] }
    })
    .to_string()
}

/// Streaming feed client for one pipeline.
pub struct FeedClient<H: IngestHandler> {
    config: FeedConfig,
    handler: H,
}

impl<H: IngestHandler> FeedClient<H> {
    pub fn new(config: FeedConfig, handler: H) -> Self {
        Self { config, handler }
    }

    /// Run the connect/stream/reconnect loop until cancelled.
    ///
    /// Returns `Ok(())` on cancellation and `Err(RetriesExhausted)` when a
    /// configured attempt cap runs out; nothing else ends the loop.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), FeedError> {
        let pipeline = self.handler.pipeline();
        let mut attempts = 0u32;

        loop {
            let end_state = match self.connect_and_stream(&cancel).await {
                Ok(()) => ConnState::Closed,
                Err(e) => {
                    warn!(%pipeline, error = %e, "Feed connection failed");
                    ConnState::Errored
                }
            };

            if cancel.is_cancelled() {
                info!(%pipeline, "Feed client stopped");
                return Ok(());
            }

            if let Some(max) = self.config.reconnect.max_attempts {
                if attempts >= max {
                    warn!(%pipeline, attempts, "Reconnect attempts exhausted");
                    return Err(FeedError::RetriesExhausted(attempts));
                }
            }
            attempts += 1;

            debug!(
                %pipeline,
                from = %end_state,
                delay_ms = self.config.reconnect.delay.as_millis() as u64,
                attempt = attempts,
                "Scheduling reconnect"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.config.reconnect.delay) => {}
            }
        }
    }

    /// One connection lifetime: connect, configure, then stream until the
    /// socket closes, errors, or the token fires.
    async fn connect_and_stream(&self, cancel: &CancellationToken) -> Result<(), FeedError> {
        let pipeline = self.handler.pipeline();

        debug!(%pipeline, state = %ConnState::Connecting, url = %self.config.ws_url, "Connecting to feed");
        let (ws_stream, response) = connect_async(&self.config.ws_url).await?;
        let (mut write, mut read) = ws_stream.split();

        debug!(%pipeline, state = %ConnState::Configuring, status = ?response.status(), "Sending configure message");
        write
            .send(Message::Text(configure_message(pipeline)))
            .await?;

        info!(%pipeline, state = %ConnState::Streaming, "Feed streaming");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        // Malformed payloads and store hiccups are logged
                        // and dropped; the connection survives.
                        if let Err(e) = self.handler.handle_message(&text).await {
                            warn!(%pipeline, error = %e, "Failed to handle feed event");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!(%pipeline, state = %ConnState::Closed, ?frame, "Feed closed the connection");
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(FeedError::ConnectionFailed(e.to_string()));
                    }
                    None => {
                        return Err(FeedError::Disconnected("stream ended".to_string()));
                    }
                }
            }
        }
    }
}
