//! Slide Processor - stream consumer + query API
//!
//! Usage:
//!   cargo run --release --bin slide_processor
//!
//! Environment variables:
//!   EXPRESS_URL - Upstream base URL; `/stream` is appended (default: https://stream-processing.onrender.com)
//!   WINDOW_SIZE - Readings per rolling window (default: 10)
//!   RECONNECT_DELAY_SECS - Fixed delay before reconnecting (default: 5)
//!   STREAM_READ_TIMEOUT_SECS - Silence before the stream is considered dead (default: 60)
//!   CONNECT_TIMEOUT_SECS - TCP connect timeout for the upstream (default: 10)
//!   BIND_ADDR - Query API listen address (default: 0.0.0.0:8000)
//!   RUST_LOG - Log filter (default: info)

use dotenv::dotenv;
use log::{error, info};
use slide_processor::aggregator_core::SlidingWindowAggregator;
use slide_processor::api;
use slide_processor::config::RuntimeConfig;
use slide_processor::streamer_core::{
    ConsumerConfig, HttpEventSource, StreamConsumer, TokioSleeper,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = RuntimeConfig::from_env()?;

    info!("🚀 Starting Slide Processor");
    info!("   ├─ Stream: {}", config.stream_url());
    info!("   ├─ Window size: {} readings", config.window_size);
    info!("   ├─ Reconnect delay: {}s", config.reconnect_delay.as_secs());
    info!("   └─ Listening on: {}", config.bind_addr);

    let aggregator = Arc::new(SlidingWindowAggregator::with_capacity(config.window_size));

    let source = HttpEventSource::new(config.stream_url(), config.connect_timeout)?;
    let consumer = StreamConsumer::new(
        Box::new(source),
        Arc::clone(&aggregator),
        Arc::new(TokioSleeper),
        ConsumerConfig::from(&config),
    );
    let consumer = consumer.spawn();
    info!("✅ Stream consumer started");

    let listener = TcpListener::bind(config.bind_addr).await?;
    let app = api::router(aggregator);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("❌ Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await;

    let stats = consumer.stats();
    consumer.stop().await;
    info!(
        "📊 Consumer totals: {} readings applied, {} events discarded, {} connect attempts",
        stats.readings_applied, stats.decode_failures, stats.connect_attempts
    );

    served?;
    Ok(())
}
