//! # relaymesh-core
//!
//! Core library for relaymesh providing:
//! - Site specification loading (one JSON/YAML document per site)
//! - Schema normalization of the legacy and explicit category shapes
//! - Layered runtime settings (defaults, file, environment)
//! - Retry execution engine with policy-based configuration

pub mod config;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod types;

pub use config::{discover_sites, load_sites, SettingsLoader, SiteFile, SiteSource};
pub use error::{Error, Result};
pub use normalize::{normalize_category, normalize_site, resolve_routing_key};
pub use types::{
    Category, CategorySpec, NormalizedSite, QueueSpec, RawCategorySpec, RawQueueSpec,
    RelaymeshSettings, SiteSpecification,
};
