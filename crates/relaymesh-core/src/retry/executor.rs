//! Retry loop

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use crate::types::RetryPolicy;

use super::error::RetryError;
use super::observer::{NoOpObserver, RetryEvent, RetryObserver};
use super::strategies::{calculate_delay, AlwaysRetry, RetryPredicate};

/// Drives an async operation under a [`RetryPolicy`]
///
/// A policy with `max_attempts: 0` still gets one attempt.
pub struct RetryExecutor<P = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    jitter: bool,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            predicate: AlwaysRetry,
            observer: NoOpObserver,
            jitter: true,
        }
    }
}

impl<P, O> RetryExecutor<P, O> {
    /// Replace the predicate deciding which failures are transient
    pub fn with_predicate<Q>(self, predicate: Q) -> RetryExecutor<Q, O> {
        let Self {
            policy,
            observer,
            jitter,
            ..
        } = self;
        RetryExecutor {
            policy,
            predicate,
            observer,
            jitter,
        }
    }

    pub fn with_observer<W>(self, observer: W) -> RetryExecutor<P, W> {
        let Self {
            policy,
            predicate,
            jitter,
            ..
        } = self;
        RetryExecutor {
            policy,
            predicate,
            observer,
            jitter,
        }
    }

    pub fn with_jitter(self, jitter: bool) -> Self {
        Self { jitter, ..self }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute<F, Fut, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: RetryPredicate<E>,
        O: RetryObserver,
    {
        let started = Instant::now();
        let ceiling = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.observer
                .observe(&RetryEvent::Attempt { attempt, ceiling });

            let error = match op().await {
                Ok(value) => {
                    self.observer.observe(&RetryEvent::Succeeded {
                        attempt,
                        elapsed: started.elapsed(),
                    });
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !self.predicate.should_retry(&error) {
                self.observer.observe(&RetryEvent::Refused {
                    attempt,
                    error: &error,
                });
                return Err(RetryError::NonRetryable {
                    attempts: attempt,
                    source: error,
                });
            }

            if attempt == ceiling {
                self.observer.observe(&RetryEvent::GaveUp {
                    attempts: attempt,
                    error: &error,
                });
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: error,
                    total_duration: started.elapsed(),
                });
            }

            let delay = calculate_delay(&self.policy, attempt, self.jitter);
            self.observer.observe(&RetryEvent::Backoff {
                attempt,
                error: &error,
                delay,
            });
            tokio::time::sleep(delay).await;
        }
    }
}
