//! Retry events and the observers that consume them

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Something that happened while an operation was being retried
#[derive(Clone, Copy)]
pub enum RetryEvent<'a> {
    /// Attempt `attempt` of at most `ceiling` is starting
    Attempt { attempt: u32, ceiling: u32 },

    /// Attempt failed transiently; the next one starts after `delay`
    Backoff {
        attempt: u32,
        error: &'a dyn Display,
        delay: Duration,
    },

    /// Attempt succeeded
    Succeeded { attempt: u32, elapsed: Duration },

    /// Last allowed attempt failed
    GaveUp { attempts: u32, error: &'a dyn Display },

    /// The predicate classified the failure as permanent
    Refused { attempt: u32, error: &'a dyn Display },
}

/// Sink for [`RetryEvent`]s
pub trait RetryObserver: Send + Sync {
    fn observe(&self, event: &RetryEvent<'_>);
}

impl<O: RetryObserver + ?Sized> RetryObserver for Arc<O> {
    fn observe(&self, event: &RetryEvent<'_>) {
        (**self).observe(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn observe(&self, _: &RetryEvent<'_>) {}
}

/// Logs events for one named management API call
#[derive(Debug, Clone)]
pub struct TracingObserver {
    call: String,
}

impl TracingObserver {
    pub fn new(call: impl Into<String>) -> Self {
        Self { call: call.into() }
    }

    pub fn call(&self) -> &str {
        &self.call
    }
}

impl RetryObserver for TracingObserver {
    fn observe(&self, event: &RetryEvent<'_>) {
        let call = self.call.as_str();
        match *event {
            RetryEvent::Attempt { attempt, ceiling } => {
                tracing::trace!(call, attempt, ceiling, "calling management API");
            }
            RetryEvent::Backoff {
                attempt,
                error,
                delay,
            } => {
                tracing::warn!(
                    call,
                    attempt,
                    %error,
                    backoff_ms = delay.as_millis() as u64,
                    "transient failure, backing off"
                );
            }
            RetryEvent::Succeeded { attempt, elapsed } if attempt > 1 => {
                tracing::info!(
                    call,
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "recovered after retrying"
                );
            }
            RetryEvent::Succeeded { .. } => {}
            RetryEvent::GaveUp { attempts, error } => {
                tracing::error!(call, attempts, %error, "giving up");
            }
            RetryEvent::Refused { attempt, error } => {
                tracing::warn!(call, attempt, %error, "failure is not retryable");
            }
        }
    }
}

/// Tallies events by kind
#[derive(Debug, Default)]
pub struct StatsObserver {
    counts: [AtomicU32; 5],
}

const ATTEMPT: usize = 0;
const BACKOFF: usize = 1;
const SUCCEEDED: usize = 2;
const GAVE_UP: usize = 3;
const REFUSED: usize = 4;

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn count(&self, slot: usize) -> u32 {
        self.counts[slot].load(Ordering::Relaxed)
    }

    pub fn attempts(&self) -> u32 {
        self.count(ATTEMPT)
    }

    pub fn backoffs(&self) -> u32 {
        self.count(BACKOFF)
    }

    pub fn successes(&self) -> u32 {
        self.count(SUCCEEDED)
    }

    pub fn give_ups(&self) -> u32 {
        self.count(GAVE_UP)
    }

    pub fn refusals(&self) -> u32 {
        self.count(REFUSED)
    }
}

impl RetryObserver for StatsObserver {
    fn observe(&self, event: &RetryEvent<'_>) {
        let slot = match event {
            RetryEvent::Attempt { .. } => ATTEMPT,
            RetryEvent::Backoff { .. } => BACKOFF,
            RetryEvent::Succeeded { .. } => SUCCEEDED,
            RetryEvent::GaveUp { .. } => GAVE_UP,
            RetryEvent::Refused { .. } => REFUSED,
        };
        self.counts[slot].fetch_add(1, Ordering::Relaxed);
    }
}
