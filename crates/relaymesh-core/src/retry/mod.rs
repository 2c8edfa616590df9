//! Retry execution engine with policy-based configuration
//!
//! Management API calls run through [`RetryExecutor`], which applies the
//! configured [`RetryPolicy`](crate::types::RetryPolicy), consults a
//! [`RetryPredicate`] to stop early on non-transient failures, and reports
//! every attempt to a [`RetryObserver`].
//!
//! # Example
//!
//! ```rust,no_run
//! use relaymesh_core::retry::{RetryError, RetryExecutor, TracingObserver};
//! use relaymesh_core::types::RetryPolicy;
//!
//! async fn example() -> Result<&'static str, RetryError<std::io::Error>> {
//!     RetryExecutor::new(RetryPolicy::default())
//!         .with_observer(TracingObserver::new("PUT /api/vhosts/siteA"))
//!         .execute(|| async { Ok("created") })
//!         .await
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::RetryExecutor;
pub use observer::{NoOpObserver, RetryEvent, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{calculate_delay, AlwaysRetry, ClosurePredicate, RetryPredicate};
