//! # relaymesh-topology
//!
//! Derives the broker object graph for one site:
//! - [`compile`]: exchanges, queues and bindings for the site and central brokers
//! - [`relay`]: the four directional shovel links per site
//! - [`definitions`]: the portable definitions document imported by site brokers
//! - [`plan`]: all of the above bundled per site

pub mod compile;
pub mod definitions;
pub mod plan;
pub mod relay;

pub use compile::{compile, BindingDecl, CompiledTopology, ExchangeDecl, QueueDecl, Variant};
pub use definitions::{rabbit_password_hash, DefinitionsDocument};
pub use plan::{plan_site, SitePlan};
pub use relay::{plan_relays, AckMode, EndpointAddress, RelayEndpoint, RelayLinks, RelaySpec, ShovelValue};
