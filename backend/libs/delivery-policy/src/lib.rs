//! Shared delivery and retry policy for the newsroom messaging paths.
//!
//! Both the event pipeline (review decision publish/consume) and the
//! synchronous RPC path (review purge during post deletion) fail under the
//! same rules: a bounded number of redeliveries with exponential backoff,
//! and a dead-letter holding area once attempts are exhausted. Exhaustion
//! never silently drops a message.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

mod dead_letter;

pub use dead_letter::{dead_letter_topic, DeadLetterError, KafkaDeadLetterPublisher};

/// Policy governing redelivery of a message or retry of a remote call.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Maximum number of redeliveries after the initial attempt
    pub max_redeliveries: u32,
    /// Backoff before the first redelivery
    pub initial_backoff: Duration,
    /// Backoff ceiling
    pub max_backoff: Duration,
    /// Multiplier applied per redelivery
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (plus or minus 30%)
    pub jitter: bool,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_redeliveries: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl DeliveryPolicy {
    /// Load the policy from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `DELIVERY_MAX_REDELIVERIES`,
    /// `DELIVERY_INITIAL_BACKOFF_MS`, `DELIVERY_MAX_BACKOFF_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_redeliveries: std::env::var("DELIVERY_MAX_REDELIVERIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_redeliveries),
            initial_backoff: std::env::var("DELIVERY_INITIAL_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: std::env::var("DELIVERY_MAX_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
            ..defaults
        }
    }

    /// Backoff before redelivery `attempt` (1-based), exponential and capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let base_ms = (self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(exp as i32))
        .min(self.max_backoff.as_millis() as f64);

        let ms = if self.jitter {
            let factor = 1.0 + rand::thread_rng().gen_range(-0.3..0.3);
            (base_ms * factor).max(0.0)
        } else {
            base_ms
        };

        Duration::from_millis(ms as u64)
    }
}

/// Error returned by [`retry`] once the policy is exhausted.
#[derive(Debug, thiserror::Error)]
#[error("delivery attempts exhausted after {attempts} tries: {last_error}")]
pub struct RetryExhausted<E> {
    /// Total attempts made (initial + redeliveries)
    pub attempts: u32,
    /// The error from the final attempt
    pub last_error: E,
}

/// Drive an async operation to success or policy exhaustion.
///
/// The operation is attempted once plus up to `max_redeliveries` times,
/// sleeping the policy backoff between attempts.
pub async fn retry<F, Fut, T, E>(policy: &DeliveryPolicy, mut op: F) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt > policy.max_redeliveries => {
                warn!(
                    attempts = attempt,
                    error = %err,
                    "delivery attempts exhausted"
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }
            Err(err) => {
                let delay = policy.backoff_for(attempt);
                warn!(
                    attempt,
                    max_redeliveries = policy.max_redeliveries,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "delivery attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_redeliveries: u32) -> DeliveryPolicy {
        DeliveryPolicy {
            max_redeliveries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_backoff_growth_and_cap() {
        let policy = DeliveryPolicy {
            max_redeliveries: 10,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: false,
        };

        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(800));
        // Far past the cap
        assert_eq!(policy.backoff_for(20), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_jitter_stays_bounded() {
        let policy = DeliveryPolicy {
            jitter: true,
            ..fast_policy(3)
        };
        for attempt in 1..=6 {
            let unjittered = DeliveryPolicy {
                jitter: false,
                ..policy.clone()
            }
            .backoff_for(attempt);
            let jittered = policy.backoff_for(attempt);
            let ceiling = unjittered.as_millis() as f64 * 1.3 + 1.0;
            assert!((jittered.as_millis() as f64) <= ceiling);
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(&fast_policy(3), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(&fast_policy(3), move || {
            let n = counter_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("broker unavailable".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<(), _> = retry(&fast_policy(2), move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err("still down".to_string()) }
        })
        .await;

        let err = result.unwrap_err();
        // Initial attempt plus two redeliveries
        assert_eq!(err.attempts, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(err.last_error, "still down");
    }
}
