//! Common test infrastructure for relaymesh-reconcile tests
//!
//! - `fixtures`: specification files and settings for temporary workspaces
//! - `mock_server`: in-memory management API on wiremock

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod mock_server;

pub use fixtures::*;
pub use mock_server::*;
