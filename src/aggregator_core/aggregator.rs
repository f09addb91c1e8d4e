//! Sliding-window aggregator shared between the stream consumer and readers

use super::summary::{round_half_even, Reading, Summary};
use super::window::Window;
use crate::config::DEFAULT_WINDOW_SIZE;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct AggregatorState {
    temperature: Window<f64>,
    humidity: Window<f64>,
    summary: Summary,
}

/// Rolling averages over the last N readings
///
/// Windows and summary live behind one lock, so a reader always sees a
/// `latest` and averages produced by the same append. Construct once and
/// share through `Arc`.
pub struct SlidingWindowAggregator {
    state: RwLock<AggregatorState>,
}

impl SlidingWindowAggregator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(AggregatorState {
                temperature: Window::new(capacity),
                humidity: Window::new(capacity),
                summary: Summary::default(),
            }),
        }
    }

    /// Add a reading to both windows and publish the new summary.
    ///
    /// Returns the summary as published so the caller can log it without
    /// taking the lock again.
    pub fn append(&self, reading: Reading) -> Summary {
        let mut state = self.write();

        state.temperature.push(reading.temperature);
        state.humidity.push(reading.humidity);

        let avg_temperature = state.temperature.mean().map(round_half_even).unwrap_or(0.0);
        let avg_humidity = state.humidity.mean().map(round_half_even).unwrap_or(0.0);

        state.summary = Summary {
            latest: reading,
            avg_temperature,
            avg_humidity,
            window_len: state.temperature.len(),
        };
        state.summary.clone()
    }

    /// Copy of the current summary; the zero summary before any append
    pub fn snapshot(&self) -> Summary {
        self.read().summary.clone()
    }

    pub fn window_len(&self) -> usize {
        self.read().temperature.len()
    }

    pub fn capacity(&self) -> usize {
        self.read().temperature.capacity()
    }

    // Every write leaves the state consistent before anything can panic,
    // so a poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, AggregatorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AggregatorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SlidingWindowAggregator {
    fn default() -> Self {
        Self::new()
    }
}
