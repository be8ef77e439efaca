//! Runtime seams for reconnect timing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Async sleep used between reconnect attempts.
#[async_trait]
pub trait ReconnectSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Reconnect backoff jitter.
pub trait BackoffJitter: Send + Sync {
    /// Return the delay to wait given the exponential base delay.
    ///
    /// Implementations must not return less than `base`.
    ///
    /// ```rust
    /// use chrono::{DateTime, TimeZone, Utc};
    /// use loyalty_dashboard::domain::BackoffJitter;
    /// use std::time::Duration;
    ///
    /// struct AttemptOffset;
    /// impl BackoffJitter for AttemptOffset {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: DateTime<Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt))
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time");
    /// let delay = AttemptOffset.jittered_delay(Duration::from_millis(500), 3, now);
    /// assert_eq!(delay, Duration::from_millis(503));
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Sleep, jitter and time sources used by the reconciler.
#[derive(Clone)]
pub struct ReconcilerRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn ReconnectSleeper>,
    /// Jitter strategy for reconnect delays.
    pub jitter: Arc<dyn BackoffJitter>,
    /// Wall clock feeding the jitter seed.
    pub clock: Arc<dyn Clock>,
}

impl Default for ReconcilerRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
            clock: Arc::new(DefaultClock),
        }
    }
}

/// Tokio-based sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl ReconnectSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, seeded from the clock and attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let seed = now
            .timestamp_nanos_opt()
            .map_or(0, i64::unsigned_abs)
            ^ u64::from(attempt);
        let extra = SmallRng::seed_from_u64(seed).gen_range(0..=max_extra);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}
