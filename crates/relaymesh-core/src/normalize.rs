//! Schema normalization
//!
//! Category blocks come in two shapes. The explicit shape lists its queues;
//! the legacy shape names a single queue with an optional category-level
//! routing key. [`normalize_category`] classifies a block once and returns
//! the canonical [`CategorySpec`], so nothing downstream branches on shape.

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{
    CategorySpec, NormalizedSite, QueueSpec, RawCategorySpec, RawQueueSpec, SiteSpecification,
    DEFAULT_ROUTING_KEY,
};

/// Shape of a raw category block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryShape<'a> {
    /// Explicit, non-empty `queues` list
    Explicit(&'a [RawQueueSpec]),
    /// Legacy single `queue` name
    Legacy(&'a str),
}

impl RawCategorySpec {
    /// Classify the block; `None` when no queue information is present
    pub fn shape(&self) -> Option<CategoryShape<'_>> {
        match (&self.queues, &self.queue) {
            (Some(queues), _) if !queues.is_empty() => Some(CategoryShape::Explicit(queues)),
            (_, Some(queue)) => Some(CategoryShape::Legacy(queue)),
            _ => None,
        }
    }
}

/// Resolve a routing key: per-queue key, then per-category key, then `#`
pub fn resolve_routing_key(queue_key: Option<&str>, category_key: Option<&str>) -> String {
    queue_key
        .or(category_key)
        .unwrap_or(DEFAULT_ROUTING_KEY)
        .to_string()
}

/// Normalize one category block into canonical form
pub fn normalize_category(category: &str, raw: &RawCategorySpec) -> Result<CategorySpec> {
    let exchange = match raw.exchange.as_deref() {
        Some(exchange) if !exchange.is_empty() => exchange.to_string(),
        _ => return Err(Error::schema(category, "no exchange declared")),
    };

    let category_key = raw.routing_key.as_deref();
    let queues = match raw.shape() {
        Some(CategoryShape::Explicit(queues)) => {
            debug!(category, count = queues.len(), "using explicit queue list");
            queues
                .iter()
                .map(|q| {
                    if q.name.is_empty() {
                        return Err(Error::schema(category, "queue entry has an empty name"));
                    }
                    Ok(QueueSpec::new(
                        &q.name,
                        resolve_routing_key(q.routing_key.as_deref(), category_key),
                    ))
                })
                .collect::<Result<Vec<_>>>()?
        }
        Some(CategoryShape::Legacy(queue)) => {
            if queue.is_empty() {
                return Err(Error::schema(category, "legacy queue name is empty"));
            }
            debug!(category, queue, "using legacy single-queue shape");
            vec![QueueSpec::new(queue, resolve_routing_key(None, category_key))]
        }
        None => return Err(Error::schema(category, "no queue or queues declared")),
    };

    Ok(CategorySpec { exchange, queues })
}

/// Normalize every category present in a site specification
pub fn normalize_site(spec: &SiteSpecification) -> Result<NormalizedSite> {
    if spec.vhost.trim().is_empty() {
        return Err(Error::config_parse(spec.name.as_str(), "vhost must not be empty"));
    }

    let mut categories = BTreeMap::new();
    for (category, raw) in &spec.categories {
        categories.insert(*category, normalize_category(category.as_str(), raw)?);
    }

    Ok(NormalizedSite {
        name: spec.name.clone(),
        vhost: spec.vhost.clone(),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SiteDocument;
    use pretty_assertions::assert_eq;

    fn raw(json: &str) -> RawCategorySpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_legacy_and_explicit_shapes_are_equivalent() {
        let legacy = raw(r##"{"exchange": "events", "queue": "events.to-aws", "routing_key": "#"}"##);
        let explicit = raw(
            r##"{"exchange": "events", "queues": [{"name": "events.to-aws", "routing_key": "#"}]}"##,
        );

        assert_eq!(
            normalize_category("events", &legacy).unwrap(),
            normalize_category("events", &explicit).unwrap()
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let spec = normalize_category(
            "telemetry",
            &raw(
                r#"{"exchange": "telemetry", "routing_key": "site.#", "queues": [
                    {"name": "hammerspace.to-aws", "routing_key": "hammerspace.#"},
                    {"name": "telemetry.to-analytics"}
                ]}"#,
            ),
        )
        .unwrap();

        let again = normalize_category("telemetry", &RawCategorySpec::from(&spec)).unwrap();
        assert_eq!(spec, again);
    }

    #[test]
    fn test_routing_key_fallback_chain() {
        assert_eq!(resolve_routing_key(Some("a.#"), Some("b.#")), "a.#");
        assert_eq!(resolve_routing_key(None, Some("b.#")), "b.#");
        assert_eq!(resolve_routing_key(None, None), "#");

        let spec = normalize_category(
            "events",
            &raw(r#"{"exchange": "events", "queues": [{"name": "events.to-aws"}]}"#),
        )
        .unwrap();
        assert_eq!(spec.queues[0].routing_key, "#");

        let spec = normalize_category(
            "telemetry",
            &raw(
                r#"{"exchange": "telemetry", "routing_key": "site.#", "queues": [{"name": "t.to-aws"}]}"#,
            ),
        )
        .unwrap();
        assert_eq!(spec.queues[0].routing_key, "site.#");
    }

    #[test]
    fn test_legacy_default_routing_key() {
        let spec = normalize_category(
            "commands",
            &raw(r#"{"exchange": "commands", "queue": "commands.from-aws"}"#),
        )
        .unwrap();
        assert_eq!(spec.queues, vec![QueueSpec::new("commands.from-aws", "#")]);
    }

    #[test]
    fn test_explicit_list_order_preserved_and_first_is_bridge() {
        let spec = normalize_category(
            "telemetry",
            &raw(
                r#"{"exchange": "telemetry", "queues": [
                    {"name": "first"}, {"name": "second"}, {"name": "third"}
                ]}"#,
            ),
        )
        .unwrap();
        let names: Vec<_> = spec.queues.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(spec.bridge_queue().unwrap().name, "first");
    }

    #[test]
    fn test_empty_queue_list_falls_back_to_legacy_queue() {
        let spec = normalize_category(
            "events",
            &raw(r#"{"exchange": "events", "queues": [], "queue": "events.to-aws"}"#),
        )
        .unwrap();
        assert_eq!(spec.queues[0].name, "events.to-aws");
    }

    #[test]
    fn test_missing_exchange_is_schema_error() {
        let err = normalize_category("events", &raw(r#"{"queue": "events.to-aws"}"#)).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_missing_queue_information_is_schema_error() {
        let err = normalize_category("events", &raw(r#"{"exchange": "events"}"#)).unwrap_err();
        assert!(matches!(err, Error::Schema { ref category, .. } if category == "events"));

        let err =
            normalize_category("events", &raw(r#"{"exchange": "events", "queues": []}"#)).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_normalize_site_propagates_schema_error() {
        let doc: SiteDocument = serde_json::from_str(
            r#"{"vhost": "siteA",
                "events": {"exchange": "events", "queue": "events.to-aws"},
                "commands": {"queue": "commands.from-aws"}}"#,
        )
        .unwrap();
        let spec = SiteSpecification::from_document("siteA", doc);
        assert!(matches!(normalize_site(&spec), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_empty_vhost_is_rejected() {
        for vhost in ["", "   "] {
            let doc: SiteDocument = serde_json::from_str(&format!(
                r#"{{"vhost": "{vhost}",
                    "events": {{"exchange": "events", "queue": "events.to-aws"}}}}"#
            ))
            .unwrap();
            let spec = SiteSpecification::from_document("siteA", doc);

            let err = normalize_site(&spec).unwrap_err();
            assert!(matches!(err, Error::ConfigParse { .. }), "{err:?}");
            assert!(err.to_string().contains("vhost must not be empty"), "{err}");
        }
    }
}
