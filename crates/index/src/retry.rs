//! Bootstrap retry with backoff.
//!
//! Used when opening a store backend: a database file can be briefly held by a
//! previous process, or a mounted volume can appear late. Per-request store
//! operations are never retried.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::thread;
use std::time::Duration;

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Configuration for retry behavior.
///
/// The default makes five attempts five seconds apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(with = "millis")]
    pub base_delay: Duration,
    /// Upper bound on any single delay, in milliseconds.
    #[serde(with = "millis")]
    pub max_delay: Duration,
    /// Multiplier applied per retry; `1.0` gives a fixed delay.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryConfig {
    /// A config that tries exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before retry number `attempt` (1-indexed; 0 means no delay).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponential = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.max(1.0).powi((attempt - 1) as i32);
        let delay_ms = exponential.min(self.max_delay.as_millis() as f64) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Run `operation` until it succeeds or the retry budget is spent.
///
/// The closure receives the 0-indexed attempt number. The last error is
/// returned when every attempt fails.
pub fn execute_with_retry<T, E, F>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt) {
            Ok(value) => {
                if attempt > 0 {
                    log::info!("succeeded after {} attempts", attempt + 1);
                }
                return Ok(value);
            }
            Err(err) if attempt >= config.max_retries => {
                log::error!("giving up after {} attempts: {err}", attempt + 1);
                return Err(err);
            }
            Err(_) => {
                attempt += 1;
                let delay = config.calculate_delay(attempt);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }
    }
}
