//! # relaymesh-broker
//!
//! Idempotent access to a broker's management HTTP API:
//! - [`client`]: the `BrokerApi` ensure-operations and their HTTP implementation
//! - [`apply`]: ordered application of a compiled topology and relay parameters

pub mod apply;
pub mod client;
pub mod error;

pub use apply::{Applier, ApplySummary};
pub use client::{classify, BrokerApi, ClientConfig, EnsureOutcome, ManagementClient, ResponseClass};
pub use error::{ApiError, Result};
