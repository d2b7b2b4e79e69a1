//! Retry strategy with exponential backoff and jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bounded exponential backoff with jitter.
///
/// `max_attempts` counts the initial try: a strategy with 3 attempts sends
/// at most one initial request and two retries. Jitter spreads concurrent
/// retry storms; set `jitter_factor` to zero for deterministic delays in
/// tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryStrategy {
    /// Total attempts, including the first (default: 3).
    pub max_attempts: u32,

    /// Delay before the first retry (default: 200 ms).
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Upper bound for any single delay (default: 5 s).
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Multiplier applied per retry (default: 2.0).
    pub multiplier: f64,

    /// Random jitter as a fraction of the computed delay, in `0.0..=1.0`
    /// (default: 0.25).
    pub jitter_factor: f64,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter_factor: 0.25,
        }
    }
}

impl RetryStrategy {
    /// Creates a strategy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A strategy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the total attempt count (clamped to at least one).
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound for any single delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the per-retry multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter fraction.
    #[must_use]
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Computes the delay before retry number `retry` (zero-based), with
    /// jitter applied.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(retry as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        let jittered = if self.jitter_factor > 0.0 {
            let spread = capped * self.jitter_factor;
            capped - spread + rand::thread_rng().gen_range(0.0..=spread * 2.0)
        } else {
            capped
        };

        Duration::from_secs_f64(jittered.clamp(0.0, self.max_delay.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let strategy = RetryStrategy::default();
        assert_eq!(strategy.max_attempts, 3);
        assert_eq!(strategy.initial_delay, Duration::from_millis(200));
        assert_eq!(strategy.max_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_deterministic_growth_without_jitter() {
        let strategy = RetryStrategy::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_multiplier(2.0)
            .with_jitter_factor(0.0);

        assert_eq!(strategy.delay_for(0), Duration::from_millis(100));
        assert_eq!(strategy.delay_for(1), Duration::from_millis(200));
        assert_eq!(strategy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_is_capped() {
        let strategy = RetryStrategy::new()
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(2))
            .with_multiplier(10.0)
            .with_jitter_factor(0.0);

        assert_eq!(strategy.delay_for(5), Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let strategy = RetryStrategy::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(10))
            .with_jitter_factor(0.5);

        for _ in 0..100 {
            let delay = strategy.delay_for(0);
            assert!(delay >= Duration::from_millis(50), "delay: {delay:?}");
            assert!(delay <= Duration::from_millis(200), "delay: {delay:?}");
        }
    }

    #[test]
    fn test_attempts_clamped_to_one() {
        assert_eq!(RetryStrategy::new().with_max_attempts(0).max_attempts, 1);
        assert_eq!(RetryStrategy::none().max_attempts, 1);
    }
}
