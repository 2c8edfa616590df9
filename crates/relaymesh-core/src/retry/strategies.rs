//! Backoff computation and retry predicates

use rand::Rng;
use std::time::Duration;

use crate::types::{RetryPolicy, RetryStrategy};

/// Pause to take after failed attempt number `attempt` (1-indexed)
///
/// The strategy's delay is clamped to `max_delay_ms`; jitter then adds a
/// random amount of at most a quarter of the clamped value.
///
/// ```rust
/// use relaymesh_core::retry::calculate_delay;
/// use relaymesh_core::types::{RetryPolicy, RetryStrategy};
///
/// let policy = RetryPolicy {
///     max_attempts: 5,
///     strategy: RetryStrategy::ExponentialBackoff,
///     backoff_multiplier: 2.0,
///     initial_delay_ms: 500,
///     max_delay_ms: 8000,
/// };
///
/// assert_eq!(calculate_delay(&policy, 1, false).as_millis(), 500);
/// assert_eq!(calculate_delay(&policy, 3, false).as_millis(), 2000);
/// assert_eq!(calculate_delay(&policy, 9, false).as_millis(), 8000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    let step = attempt.max(1) - 1;
    let initial = policy.initial_delay_ms;

    let unclamped = match policy.strategy {
        RetryStrategy::None => return Duration::ZERO,
        RetryStrategy::FixedDelay => initial,
        RetryStrategy::LinearBackoff => initial.saturating_mul(u64::from(step) + 1),
        RetryStrategy::ExponentialBackoff => {
            let exponent = i32::try_from(step).unwrap_or(i32::MAX);
            // f64 -> u64 casts saturate
            (initial as f64 * policy.backoff_multiplier.powi(exponent)) as u64
        }
    };

    let millis = unclamped.min(policy.max_delay_ms);
    let spread = if jitter { millis / 4 } else { 0 };
    let extra = if spread == 0 {
        0
    } else {
        rand::rng().random_range(0..=spread)
    };

    Duration::from_millis(millis + extra)
}

/// Decides whether a failed attempt is worth repeating
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Treats every failure as transient
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _: &E) -> bool {
        true
    }
}

/// Adapts a `Fn(&E) -> bool` into a [`RetryPredicate`]
pub struct ClosurePredicate<F>(F);

impl<F> ClosurePredicate<F> {
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.0)(error)
    }
}
