//! Common test infrastructure for relaymesh-broker tests
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `fixtures`: clients with fast retry policies, sample topologies
//! - `mock_server`: wiremock helpers and an in-memory management API

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod mock_server;

pub use fixtures::*;
pub use mock_server::*;
