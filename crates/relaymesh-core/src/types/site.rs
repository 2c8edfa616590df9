//! Site specification types
//!
//! A site document is decoded into [`SiteDocument`] (raw, both category
//! shapes accepted), lifted into a [`SiteSpecification`] keyed by site name,
//! and finally normalized into a [`NormalizedSite`] whose categories all use
//! the explicit list-of-queues form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Routing key used when neither the queue nor the category declares one
pub const DEFAULT_ROUTING_KEY: &str = "#";

/// The fixed set of message categories, in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Telemetry,
    Events,
    Performance,
    Commands,
}

impl Category {
    /// All categories in deterministic output order
    pub const ALL: [Category; 4] = [
        Category::Telemetry,
        Category::Events,
        Category::Performance,
        Category::Commands,
    ];

    /// Key of this category in a site document
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Telemetry => "telemetry",
            Category::Events => "events",
            Category::Performance => "performance",
            Category::Commands => "commands",
        }
    }

    /// Direction of the relay link carrying this category
    pub fn direction(&self) -> RelayDirection {
        match self {
            Category::Commands => RelayDirection::Inbound,
            _ => RelayDirection::Outbound,
        }
    }

    /// Name of the relay link carrying this category
    pub fn relay_name(&self) -> &'static str {
        match self {
            Category::Telemetry => "telemetry_to_aws",
            Category::Events => "events_to_aws",
            Category::Performance => "performance_to_aws",
            Category::Commands => "commands_from_aws",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a relay link moves messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayDirection {
    /// Site broker to central broker
    Outbound,
    /// Central broker to site broker
    Inbound,
}

/// A queue entry of the explicit category shape, as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQueueSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_key: Option<String>,
}

/// A category block as written, in either supported shape
///
/// Legacy: `{exchange, queue, routing_key?}`.
/// Explicit: `{exchange, queues: [{name, routing_key?}], routing_key?}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCategorySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queues: Option<Vec<RawQueueSpec>>,
}

/// The document stored in one specification file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteDocument {
    /// Virtual host of this site on the central broker
    pub vhost: String,

    #[serde(default)]
    pub telemetry: Option<RawCategorySpec>,

    #[serde(default)]
    pub events: Option<RawCategorySpec>,

    #[serde(default)]
    pub performance: Option<RawCategorySpec>,

    #[serde(default)]
    pub commands: Option<RawCategorySpec>,
}

/// One site's specification, keyed by site name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSpecification {
    /// Site name (the specification file stem)
    pub name: String,

    /// Virtual host of this site on the central broker
    pub vhost: String,

    /// Category blocks present in the document
    pub categories: BTreeMap<Category, RawCategorySpec>,
}

impl SiteSpecification {
    /// Lift a decoded document into a named specification
    pub fn from_document(name: impl Into<String>, doc: SiteDocument) -> Self {
        let mut categories = BTreeMap::new();
        let blocks = [
            (Category::Telemetry, doc.telemetry),
            (Category::Events, doc.events),
            (Category::Performance, doc.performance),
            (Category::Commands, doc.commands),
        ];
        for (category, block) in blocks {
            if let Some(block) = block {
                categories.insert(category, block);
            }
        }

        Self {
            name: name.into(),
            vhost: doc.vhost,
            categories,
        }
    }
}

/// A queue in canonical form, routing key resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: String,
    pub routing_key: String,
}

impl QueueSpec {
    pub fn new(name: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing_key: routing_key.into(),
        }
    }
}

/// A category in canonical form
///
/// Invariant: `queues` is non-empty after normalization and its first
/// element is the bridge queue used by the category's relay link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub exchange: String,
    pub queues: Vec<QueueSpec>,
}

impl CategorySpec {
    /// The queue relay links read from or write to
    pub fn bridge_queue(&self) -> Option<&QueueSpec> {
        self.queues.first()
    }
}

impl From<&CategorySpec> for RawCategorySpec {
    fn from(spec: &CategorySpec) -> Self {
        RawCategorySpec {
            exchange: Some(spec.exchange.clone()),
            queue: None,
            routing_key: None,
            queues: Some(
                spec.queues
                    .iter()
                    .map(|q| RawQueueSpec {
                        name: q.name.clone(),
                        routing_key: Some(q.routing_key.clone()),
                    })
                    .collect(),
            ),
        }
    }
}

/// A site whose categories have all been normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSite {
    pub name: String,
    pub vhost: String,
    pub categories: BTreeMap<Category, CategorySpec>,
}

impl NormalizedSite {
    /// Look up a category the caller depends on
    pub fn category(&self, category: Category) -> Result<&CategorySpec> {
        self.categories
            .get(&category)
            .ok_or_else(|| Error::missing_category(category))
    }

    /// Present categories in fixed category order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategorySpec)> {
        Category::ALL
            .into_iter()
            .filter_map(|c| self.categories.get(&c).map(|spec| (c, spec)))
    }
}
