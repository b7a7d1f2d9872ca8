//! Reconnect behavior against a local websocket server.

use futures_util::StreamExt;
use sentinel_core::Pipeline;
use sentinel_feeds::{
    FeedClient, FeedConfig, FeedError, PriceIngestor, ReconnectPolicy, WatchRegistry,
};
use sentinel_store::{AlertQueue, KvStore, MemoryStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Accepts `sessions` connections, records the first message of each along
/// with its arrival time, then drops the connection.
async fn run_drop_server(
    listener: TcpListener,
    sessions: usize,
    tx: mpsc::UnboundedSender<(Instant, String)>,
) {
    for _ in 0..sessions {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        if let Some(Ok(msg)) = ws.next().await {
            let text = msg.into_text().expect("text frame");
            tx.send((Instant::now(), text)).expect("record");
        }
        // Connection dropped here: the client sees a close/error and must
        // schedule a reconnect.
    }
}

fn price_client(addr: std::net::SocketAddr, policy: ReconnectPolicy) -> FeedClient<PriceIngestor> {
    let store = Arc::new(MemoryStore::new()) as Arc<dyn KvStore>;
    let registry = Arc::new(WatchRegistry::new());
    let queue = AlertQueue::new(store, Pipeline::Price);

    let mut config = FeedConfig::new(format!("ws://{addr}"));
    config.reconnect = policy;
    FeedClient::new(config, PriceIngestor::new(registry, queue))
}

#[tokio::test]
async fn test_close_triggers_one_timed_reconnect_with_fresh_configure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(run_drop_server(listener, 2, tx));

    let delay = Duration::from_millis(200);
    let client = price_client(
        addr,
        ReconnectPolicy {
            delay,
            max_attempts: Some(1),
        },
    );

    let result = client.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(FeedError::RetriesExhausted(1))));
    server.await.unwrap();

    let (first_at, first_cfg) = rx.recv().await.expect("first configure");
    let (second_at, second_cfg) = rx.recv().await.expect("configure after reconnect");
    assert!(rx.recv().await.is_none(), "exactly one reconnect");

    // The configure message is re-sent verbatim on every new connection.
    assert_eq!(first_cfg, second_cfg);
    let parsed: serde_json::Value = serde_json::from_str(&first_cfg).unwrap();
    assert_eq!(parsed["type"], "configure");
    assert_eq!(parsed["filters"]["oraclePrices"], serde_json::json!([]));

    // The reconnect waited out the fixed delay.
    assert!(
        second_at.duration_since(first_at) >= Duration::from_millis(180),
        "reconnect arrived before the configured delay"
    );
}

#[tokio::test]
async fn test_cancellation_stops_the_client() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(run_drop_server(listener, 1, tx));

    let client = price_client(
        addr,
        ReconnectPolicy {
            delay: Duration::from_secs(3600),
            max_attempts: None,
        },
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(client.run(cancel.clone()));

    // Wait for the first session to be torn down, leaving the client parked
    // in its reconnect sleep, then cancel.
    rx.recv().await.expect("first configure");
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("client did not stop on cancellation")
        .unwrap();
    assert!(result.is_ok());
}
