//! Long-running stream consumer feeding the sliding-window aggregator
//!
//! State machine:
//!
//! ```text
//! Connecting ──subscribe ok──► Streaming ──(decode loop)──┐
//!     ▲                            │                      │
//!     │                     error / end / timeout  ◄──────┘
//!     └──── fixed delay ◄──── Backoff
//! ```
//!
//! Only `ConsumerHandle::stop` leaves the loop.

use crate::aggregator_core::{Reading, SlidingWindowAggregator};
use crate::config::RuntimeConfig;
use crate::streamer_core::backoff::{FixedBackoff, Sleeper};
use crate::streamer_core::client::{EventSource, StreamError};
use futures::StreamExt;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerState {
    Connecting,
    Streaming,
    Backoff,
    Stopped,
}

impl ConsumerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConsumerState::Connecting,
            1 => ConsumerState::Streaming,
            2 => ConsumerState::Backoff,
            _ => ConsumerState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConsumerState::Connecting => 0,
            ConsumerState::Streaming => 1,
            ConsumerState::Backoff => 2,
            ConsumerState::Stopped => 3,
        }
    }
}

/// Counters updated by the consumer task, readable from anywhere
#[derive(Debug, Default)]
pub struct ConsumerStats {
    state: AtomicU8,
    connect_attempts: AtomicU64,
    events_received: AtomicU64,
    readings_applied: AtomicU64,
    decode_failures: AtomicU64,
    disconnects: AtomicU64,
    last_reading_at: AtomicI64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerStatsSnapshot {
    pub state: ConsumerState,
    pub connect_attempts: u64,
    pub events_received: u64,
    pub readings_applied: u64,
    pub decode_failures: u64,
    pub disconnects: u64,
    /// Unix timestamp of the last applied reading
    pub last_reading_at: Option<i64>,
}

impl ConsumerStats {
    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        let last = self.last_reading_at.load(Ordering::Relaxed);
        ConsumerStatsSnapshot {
            state: self.state(),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            readings_applied: self.readings_applied.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            last_reading_at: (last != 0).then_some(last),
        }
    }

    pub fn state(&self) -> ConsumerState {
        ConsumerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConsumerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub reconnect_delay: Duration,
    pub read_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(crate::config::DEFAULT_RECONNECT_DELAY_SECS),
            read_timeout: Duration::from_secs(crate::config::DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

impl From<&RuntimeConfig> for ConsumerConfig {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay,
            read_timeout: config.read_timeout,
        }
    }
}

pub struct StreamConsumer {
    source: Box<dyn EventSource>,
    aggregator: Arc<SlidingWindowAggregator>,
    sleeper: Arc<dyn Sleeper>,
    config: ConsumerConfig,
    stats: Arc<ConsumerStats>,
}

impl StreamConsumer {
    pub fn new(
        source: Box<dyn EventSource>,
        aggregator: Arc<SlidingWindowAggregator>,
        sleeper: Arc<dyn Sleeper>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            source,
            aggregator,
            sleeper,
            config,
            stats: Arc::new(ConsumerStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.stats)
    }

    /// Start the loop on its own task
    pub fn spawn(self) -> ConsumerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = self.stats();
        let task = tokio::spawn(async move { self.run(shutdown_rx).await });

        ConsumerHandle {
            shutdown_tx,
            task,
            stats,
        }
    }

    /// Consume until `shutdown` flips to true (or its sender is dropped).
    ///
    /// Every connection failure is retried after the fixed delay, forever.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = FixedBackoff::new(self.config.reconnect_delay);

        loop {
            let outcome = tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                outcome = self.stream_once(&mut backoff) => outcome,
            };

            self.stats.disconnects.fetch_add(1, Ordering::Relaxed);
            match outcome {
                Ok(()) => log::warn!("⚠️  {}", StreamError::Ended),
                Err(e) => log::error!("❌ Stream connection error: {}", e),
            }

            self.stats.set_state(ConsumerState::Backoff);
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => break,
                _ = backoff.sleep(self.sleeper.as_ref()) => {}
            }
        }

        self.stats.set_state(ConsumerState::Stopped);
        log::info!("Stream consumer stopped");
    }

    /// One connection lifetime. `Ok` means the server closed the stream.
    async fn stream_once(&self, backoff: &mut FixedBackoff) -> Result<(), StreamError> {
        self.stats.set_state(ConsumerState::Connecting);
        self.stats.connect_attempts.fetch_add(1, Ordering::Relaxed);
        log::info!("🔌 Connecting to stream at {}...", self.source.describe());

        let mut events = self.source.subscribe().await?;

        self.stats.set_state(ConsumerState::Streaming);
        backoff.reset();
        log::info!("✅ Connected to event stream");

        loop {
            let next = tokio::time::timeout(self.config.read_timeout, events.next())
                .await
                .map_err(|_| StreamError::Timeout(self.config.read_timeout))?;

            match next {
                Some(Ok(event)) => self.handle_event(&event.data),
                Some(Err(e)) => return Err(e),
                None => return Ok(()),
            }
        }
    }

    fn handle_event(&self, data: &str) {
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);

        let reading = match Reading::decode(data) {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("Discarding event: {} (data: {})", e, data);
                return;
            }
        };

        let (temperature, humidity) = (reading.temperature, reading.humidity);
        let summary = self.aggregator.append(reading);
        self.stats.readings_applied.fetch_add(1, Ordering::Relaxed);
        self.stats
            .last_reading_at
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);

        log::info!(
            "Processed: Temp={}°C, Hum={}% | Avg Temp={}°C, Avg Hum={}% | Window size={}",
            temperature,
            humidity,
            summary.avg_temperature,
            summary.avg_humidity,
            summary.window_len
        );
    }
}

/// Control handle for a spawned consumer
pub struct ConsumerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    stats: Arc<ConsumerStats>,
}

impl ConsumerHandle {
    pub fn stats(&self) -> ConsumerStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the task to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            log::error!("Stream consumer task failed: {}", e);
        }
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
