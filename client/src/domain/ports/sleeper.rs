//! Driven port for waiting, so simulated latency can be skipped in tests.

use std::time::Duration;

use async_trait::async_trait;

/// Asynchronous delay.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
