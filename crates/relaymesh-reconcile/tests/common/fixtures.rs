//! Specification and settings fixtures

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use relaymesh_core::types::{RetryPolicy, RetryStrategy, Secret};
use relaymesh_core::RelaymeshSettings;
use tempfile::TempDir;

pub const SITE_A_JSON: &str = r#"{
    "vhost": "siteA",
    "telemetry": {"exchange": "telemetry", "queues": [{"name": "hammerspace.to-aws", "routing_key": "hammerspace.#"}]},
    "events": {"exchange": "events", "queue": "events.to-aws"},
    "performance": {"exchange": "performance", "queue": "performance.to-aws"},
    "commands": {"exchange": "commands", "queues": [{"name": "commands.from-aws", "routing_key": "site-a.#"}]}
}"#;

pub const SITE_B_YAML: &str = r##"vhost: siteB
telemetry:
  exchange: telemetry
  queue: telemetry.to-aws
  routing_key: "siteb.#"
events:
  exchange: events
  queue: events.to-aws
performance:
  exchange: performance
  queue: performance.to-aws
commands:
  exchange: commands
  queue: commands.from-aws
"##;

/// `SITE_A_JSON` with another vhost
pub fn site_json(vhost: &str) -> String {
    SITE_A_JSON.replace("\"siteA\"", &format!("\"{}\"", vhost))
}

/// Missing the commands category: compiles, but cannot plan relays
pub const SITE_NO_COMMANDS_JSON: &str = r#"{
    "vhost": "siteC",
    "telemetry": {"exchange": "telemetry", "queue": "t"},
    "events": {"exchange": "events", "queue": "e"},
    "performance": {"exchange": "performance", "queue": "p"}
}"#;

/// Category without any queue information
pub const SITE_BAD_SCHEMA_JSON: &str = r#"{
    "vhost": "siteD",
    "telemetry": {"exchange": "telemetry"},
    "events": {"exchange": "events", "queue": "e"},
    "performance": {"exchange": "performance", "queue": "p"},
    "commands": {"exchange": "commands", "queue": "c"}
}"#;

/// Temporary workspace with a `specs/` input and a `definitions/` output directory
pub struct Workspace {
    _dir: TempDir,
    pub root: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        fs::create_dir_all(root.join("specs")).expect("specs dir");
        Self { _dir: dir, root }
    }

    pub fn specs(&self) -> Utf8PathBuf {
        self.root.join("specs")
    }

    pub fn output(&self) -> Utf8PathBuf {
        self.root.join("definitions")
    }

    pub fn write_spec(&self, file_name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.specs().join(file_name);
        fs::write(&path, contents).expect("write spec");
        path
    }

    pub fn document(&self, site: &str) -> Utf8PathBuf {
        self.output().join(format!("{}-definitions.json", site))
    }
}

/// Settings pointing at a mock management API, with millisecond retries
pub fn settings_for(api_url: Option<String>, output: &Utf8Path) -> RelaymeshSettings {
    let mut settings = RelaymeshSettings::default();
    settings.central.api_url = api_url;
    settings.central.amqp_host = Some("central.example.com".into());
    settings.central.password = Secret::new("c3ntral");
    settings.site.password = Secret::new("s1te");
    settings.output_dir = output.to_path_buf();
    settings.network.http_timeout_secs = 5;
    settings.retry = RetryPolicy {
        max_attempts: 2,
        strategy: RetryStrategy::FixedDelay,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        ..Default::default()
    };
    settings
}
