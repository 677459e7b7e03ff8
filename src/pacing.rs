//! Batch pacing to cap provider throughput.
//!
//! Pacing exists to keep the sustained send rate at or below the configured
//! messages-per-minute limit, not to guarantee an exact interval: the pause
//! is applied after each full batch flush, so
//! `interval = batch_size / rate_per_minute × 60` seconds.

use std::time::Duration;

/// The pause applied between full batch flushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    interval: Duration,
}

impl Pacing {
    /// Compute the pacing interval from the configured limits.
    ///
    /// A rate limit below 1 is treated as 1 rather than dividing by zero.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        reason = "Batch sizes are nowhere near 2^52"
    )]
    pub fn from_limits(batch_size: usize, rate_limit_per_minute: u32) -> Self {
        let per_minute = f64::from(rate_limit_per_minute.max(1));
        let seconds = batch_size as f64 / per_minute * 60.0;
        Self {
            interval: Duration::from_secs_f64(seconds),
        }
    }

    /// The computed pause duration.
    #[must_use]
    pub const fn interval(self) -> Duration {
        self.interval
    }

    /// Sleep for the pacing interval, if there is one.
    pub async fn pause(self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}
