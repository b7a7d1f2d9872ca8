//! Sentinel Bot - Headless Alert Server
//!
//! Runs both alert pipelines (oracle price, whale transfer): feed ingestors,
//! watch registry refreshers, and alert dispatchers, all coordinating
//! through the persisted store.

mod settings;

use clap::Parser;
use settings::Settings;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sentinel_alerts::{Dispatcher, TelegramSink};
use sentinel_core::{Pipeline, PriceWatch, TransferWatch};
use sentinel_feeds::{
    run_refresh, FeedClient, FeedConfig, PriceIngestor, TransferIngestor, WatchRegistry,
};
use sentinel_store::{AlertQueue, KvStore, RedisStore, WatchLimit, WatchStore};

/// Sentinel Bot CLI
#[derive(Parser, Debug)]
#[command(name = "sentinel-bot")]
#[command(about = "On-chain price and whale-transfer alert pipelines", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Override the store URL from the environment
    #[arg(long)]
    redis_url: Option<String>,

    /// Override the feed websocket URL from the environment
    #[arg(long)]
    feed_url: Option<String>,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = args.redis_url {
        settings.redis_url = url;
    }
    if let Some(url) = args.feed_url {
        settings.feed_ws_url = url;
    }

    // The store being unreachable at boot is the one fatal condition;
    // everything after this point recovers in place.
    let store: Arc<dyn KvStore> = match RedisStore::connect(&settings.redis_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Cannot reach store at {}: {}", settings.redis_url, e);
            std::process::exit(1);
        }
    };

    let sink = Arc::new(TelegramSink::new(&settings.telegram_token));
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    // Price pipeline.
    let price_watches = Arc::new(WatchStore::<PriceWatch>::new(
        store.clone(),
        Pipeline::Price,
        WatchLimit::Global(settings.max_price_watches),
    ));
    let price_registry = Arc::new(WatchRegistry::new());

    tasks.push(tokio::spawn(run_refresh(
        price_registry.clone(),
        price_watches.clone(),
        settings.refresh_interval,
        cancel.clone(),
    )));

    {
        let ingestor = PriceIngestor::new(
            price_registry.clone(),
            AlertQueue::new(store.clone(), Pipeline::Price),
        );
        let mut config = FeedConfig::new(settings.feed_ws_url.clone());
        config.reconnect = settings.reconnect.clone();
        let client = FeedClient::new(config, ingestor);
        let token = cancel.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = client.run(token).await {
                error!("Price feed client exited: {}", e);
            }
        }));
    }

    {
        let dispatcher = Dispatcher::new(
            AlertQueue::new(store.clone(), Pipeline::Price),
            price_watches,
            sink.clone(),
        )
        .with_poll_interval(settings.poll_interval);
        tasks.push(tokio::spawn(dispatcher.run(cancel.clone())));
    }

    // Transfer pipeline.
    let transfer_watches = Arc::new(WatchStore::<TransferWatch>::new(
        store.clone(),
        Pipeline::Transfer,
        WatchLimit::PerIdentifier(settings.max_transfer_watches),
    ));
    let transfer_registry = Arc::new(WatchRegistry::new());

    tasks.push(tokio::spawn(run_refresh(
        transfer_registry.clone(),
        transfer_watches.clone(),
        settings.refresh_interval,
        cancel.clone(),
    )));

    {
        let ingestor = TransferIngestor::new(
            transfer_registry.clone(),
            AlertQueue::new(store.clone(), Pipeline::Transfer),
        );
        let mut config = FeedConfig::new(settings.feed_ws_url.clone());
        config.reconnect = settings.reconnect.clone();
        let client = FeedClient::new(config, ingestor);
        let token = cancel.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = client.run(token).await {
                error!("Transfer feed client exited: {}", e);
            }
        }));
    }

    {
        let dispatcher = Dispatcher::new(
            AlertQueue::new(store.clone(), Pipeline::Transfer),
            transfer_watches,
            sink.clone(),
        )
        .with_poll_interval(settings.poll_interval);
        tasks.push(tokio::spawn(dispatcher.run(cancel.clone())));
    }

    info!("Both pipelines running; press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
    cancel.cancel();

    for task in tasks {
        let _ = task.await;
    }
    info!("Shutdown complete");
}
