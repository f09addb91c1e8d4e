use async_trait::async_trait;
use std::time::Duration;

/// Source of delays for the reconnect loop; tests swap in a fake
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Fixed-delay retry policy with no attempt limit
#[derive(Debug)]
pub struct FixedBackoff {
    delay: Duration,
    current_attempt: u32,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current_attempt: 0,
        }
    }

    pub async fn sleep(&mut self, sleeper: &dyn Sleeper) {
        self.current_attempt = self.current_attempt.saturating_add(1);

        log::warn!(
            "⏳ Retry attempt {} in {}s",
            self.current_attempt,
            self.delay.as_secs_f64()
        );

        sleeper.sleep(self.delay).await;
    }

    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
