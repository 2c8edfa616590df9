//! Terminal outcome of a retried operation

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Wraps the error of the last attempt with how the retry loop ended
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a transient error
    Exhausted {
        attempts: u32,
        source: E,
        total_duration: Duration,
    },

    /// A permanent error ended the loop early
    NonRetryable { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    fn parts(&self) -> (u32, &E) {
        match self {
            Self::Exhausted {
                attempts, source, ..
            }
            | Self::NonRetryable { attempts, source } => (*attempts, source),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.parts().0
    }

    pub fn last_error(&self) -> &E {
        self.parts().1
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn into_source(self) -> E {
        let (Self::Exhausted { source, .. } | Self::NonRetryable { source, .. }) = self;
        source
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted {
                attempts,
                source,
                total_duration,
            } => write!(
                f,
                "{source} (gave up after {attempts} attempts in {}ms)",
                total_duration.as_millis()
            ),
            Self::NonRetryable { attempts, source } => {
                write!(f, "{source} (permanent failure on attempt {attempts})")
            }
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.last_error())
    }
}
