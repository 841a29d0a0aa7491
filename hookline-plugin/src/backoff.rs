//! Exponential backoff for retry delays

use rand::Rng;
use std::time::Duration;

/// Backoff configuration
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Initial delay
    pub base: Duration,
    /// Maximum delay
    pub max: Duration,
    /// Multiplier for each attempt
    pub factor: f64,
    /// Jitter factor (0.0 - 1.0)
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            max: Duration::from_secs(10),
            factor: 2.0,
            jitter: 0.3,
        }
    }
}

impl BackoffConfig {
    /// A fixed delay on every attempt, jitter included.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            max: delay,
            factor: 1.0,
            jitter: 0.0,
        }
    }

    /// Delay before re-running a request that already failed `attempt` times.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Cap the exponent to avoid i32 wrap
        let base_secs = self.base.as_secs_f64();
        let exponent: i32 = attempt.min(i32::MAX as u32).try_into().unwrap_or(i32::MAX);
        let exp_delay = base_secs * self.factor.powi(exponent);

        let jitter_range = exp_delay * self.jitter;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        let delay_with_jitter = (exp_delay + jitter).max(0.0);

        let final_secs = delay_with_jitter.min(self.max.as_secs_f64());
        Duration::from_secs_f64(final_secs)
    }
}
