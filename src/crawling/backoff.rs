//! # Retry Timing
//!
//! Exponential backoff between retries of the same page and a jittered pause
//! between successful pages. Sleeping goes through [`Sleeper`] so the crawl
//! can be driven in tests without waiting in real time.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Exponential backoff policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay unit multiplied by `multiplier^retry`
    pub base_delay_ms: u64,
    pub multiplier: f64,
    /// Consecutive failed attempts after which the crawl stops
    pub max_attempts: u32,
    /// Upper bound for a single backoff sleep
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 2_000,
            multiplier: 2.0,
            max_attempts: 3,
            max_delay_ms: 60_000,
        }
    }
}

impl BackoffPolicy {
    pub const fn should_retry(&self, consecutive_failures: u32) -> bool {
        consecutive_failures < self.max_attempts
    }

    /// Sleep before retry number `retry` (1-based): `base * multiplier^retry`, capped
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay = (self.base_delay_ms as f64) * self.multiplier.powi(exponent);
        let capped = if delay.is_finite() {
            (delay as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        };
        Duration::from_millis(capped)
    }
}

/// Uniform random pause between successful pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for JitterRange {
    fn default() -> Self {
        Self {
            min_ms: 1_000,
            max_ms: 3_000,
        }
    }
}

impl JitterRange {
    pub fn sample(&self) -> Duration {
        let (low, high) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(fastrand::u64(low..=high))
    }
}

/// Why the driver is pausing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseKind {
    /// Politeness delay after a page that moved the crawl forward
    Jitter,
    /// Waiting before retrying the same page
    Backoff,
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration, kind: PauseKind);
}

/// Real-time sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration, _kind: PauseKind) {
        tokio::time::sleep(duration).await;
    }
}
