//! Client and topology fixtures

use std::time::Duration;

use relaymesh_broker::{ClientConfig, ManagementClient};
use relaymesh_core::types::{RetryPolicy, RetryStrategy, Secret};
use relaymesh_core::{normalize_site, types::SiteDocument, NormalizedSite, SiteSpecification};
use wiremock::MockServer;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "s3cret";

/// Retry policy with millisecond delays
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        strategy: RetryStrategy::FixedDelay,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        ..Default::default()
    }
}

/// Client for a mock server, three attempts per call
pub fn client_for(server: &MockServer) -> ManagementClient {
    client_with(server, fast_retry(3), Duration::from_secs(5))
}

pub fn client_with(server: &MockServer, retry: RetryPolicy, timeout: Duration) -> ManagementClient {
    let config = ClientConfig::new(server.uri(), ADMIN_USER, Secret::new(ADMIN_PASSWORD))
        .with_retry(retry)
        .with_timeout(timeout);
    ManagementClient::new(config).expect("client")
}

pub const SITE_A: &str = r#"{
    "vhost": "siteA",
    "telemetry": {"exchange": "telemetry", "queues": [{"name": "hammerspace.to-aws", "routing_key": "hammerspace.#"}]},
    "events": {"exchange": "events", "queue": "events.to-aws"},
    "performance": {"exchange": "performance", "queue": "performance.to-aws", "routing_key": "perf.#"},
    "commands": {"exchange": "commands", "queues": [{"name": "commands.from-aws", "routing_key": "site-a.#"}]}
}"#;

pub fn site_a() -> NormalizedSite {
    let doc: SiteDocument = serde_json::from_str(SITE_A).expect("fixture parses");
    normalize_site(&SiteSpecification::from_document("siteA", doc)).expect("fixture normalizes")
}
