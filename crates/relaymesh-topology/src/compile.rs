//! Topology compilation
//!
//! The same normalized site compiles to two object sets. The central broker
//! aggregates every category under the site's virtual host. The site broker
//! gets every exchange, but only the `commands` queues: the other categories
//! leave the site through relay links reading the bridge queue directly.

use relaymesh_core::{Category, NormalizedSite, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Virtual host used on site-local brokers
pub const SITE_VHOST: &str = "/";

/// Exchange type of every declared exchange
pub const EXCHANGE_TYPE: &str = "topic";

/// Which broker a topology is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Site,
    Central,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub exchange_type: String,
    pub durable: bool,
    pub auto_delete: bool,
}

impl ExchangeDecl {
    /// Durable, non-auto-delete topic exchange
    pub fn topic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exchange_type: EXCHANGE_TYPE.to_string(),
            durable: true,
            auto_delete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDecl {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
}

impl QueueDecl {
    pub fn durable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            auto_delete: false,
        }
    }
}

/// Exchange to queue binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDecl {
    pub source: String,
    pub destination: String,
    pub routing_key: String,
}

/// Object set for one broker, derived from one site specification
///
/// Exchanges and queues are unique by name, bindings by their full triple.
/// Every binding refers to an exchange and a queue of the same topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledTopology {
    pub variant: Variant,
    pub vhost: String,
    pub exchanges: Vec<ExchangeDecl>,
    pub queues: Vec<QueueDecl>,
    pub bindings: Vec<BindingDecl>,
}

impl CompiledTopology {
    fn new(variant: Variant, vhost: impl Into<String>) -> Self {
        Self {
            variant,
            vhost: vhost.into(),
            exchanges: Vec::new(),
            queues: Vec::new(),
            bindings: Vec::new(),
        }
    }

    fn add_exchange(&mut self, name: &str) {
        if !self.has_exchange(name) {
            self.exchanges.push(ExchangeDecl::topic(name));
        }
    }

    fn add_queue(&mut self, name: &str) {
        if !self.has_queue(name) {
            self.queues.push(QueueDecl::durable(name));
        }
    }

    fn add_binding(&mut self, exchange: &str, queue: &str, routing_key: &str) {
        let exists = self.bindings.iter().any(|b| {
            b.source == exchange && b.destination == queue && b.routing_key == routing_key
        });
        if !exists {
            self.bindings.push(BindingDecl {
                source: exchange.to_string(),
                destination: queue.to_string(),
                routing_key: routing_key.to_string(),
            });
        }
    }

    pub fn has_exchange(&self, name: &str) -> bool {
        self.exchanges.iter().any(|e| e.name == name)
    }

    pub fn has_queue(&self, name: &str) -> bool {
        self.queues.iter().any(|q| q.name == name)
    }

    /// Total number of declared objects, vhost excluded
    pub fn object_count(&self) -> usize {
        self.exchanges.len() + self.queues.len() + self.bindings.len()
    }

    /// Bindings referring to objects outside this topology
    pub fn dangling_bindings(&self) -> Vec<&BindingDecl> {
        let exchanges: BTreeSet<&str> = self.exchanges.iter().map(|e| e.name.as_str()).collect();
        let queues: BTreeSet<&str> = self.queues.iter().map(|q| q.name.as_str()).collect();
        self.bindings
            .iter()
            .filter(|b| {
                !exchanges.contains(b.source.as_str()) || !queues.contains(b.destination.as_str())
            })
            .collect()
    }
}

/// Compile a normalized site for the given broker
///
/// Categories absent from the site contribute nothing; relay planning is
/// where the full category set is required.
pub fn compile(site: &NormalizedSite, variant: Variant) -> Result<CompiledTopology> {
    let vhost = match variant {
        Variant::Site => SITE_VHOST,
        Variant::Central => site.vhost.as_str(),
    };
    let mut topology = CompiledTopology::new(variant, vhost);

    for (category, spec) in site.iter() {
        topology.add_exchange(&spec.exchange);

        let mirror_queues = match variant {
            Variant::Central => true,
            Variant::Site => category == Category::Commands,
        };
        if !mirror_queues {
            continue;
        }
        for queue in &spec.queues {
            topology.add_queue(&queue.name);
            topology.add_binding(&spec.exchange, &queue.name, &queue.routing_key);
        }
    }

    tracing::debug!(
        site = %site.name,
        variant = ?variant,
        exchanges = topology.exchanges.len(),
        queues = topology.queues.len(),
        bindings = topology.bindings.len(),
        "compiled topology"
    );

    Ok(topology)
}
