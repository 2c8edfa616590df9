//! Runtime settings for relaymesh.yaml

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelaymeshSettings {
    /// Central broker endpoints and credentials
    #[serde(default)]
    pub central: CentralSettings,

    /// Site broker endpoints and administrative user
    #[serde(default)]
    pub site: SiteSettings,

    /// HTTP and worker pool settings
    #[serde(default)]
    pub network: NetworkSettings,

    /// Retry policy for management API calls
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Directory receiving `<site>-definitions.json`
    #[serde(default = "default_output_dir")]
    pub output_dir: Utf8PathBuf,
}

impl Default for RelaymeshSettings {
    fn default() -> Self {
        Self {
            central: CentralSettings::default(),
            site: SiteSettings::default(),
            network: NetworkSettings::default(),
            retry: RetryPolicy::default(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("definitions")
}

/// Central broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CentralSettings {
    /// Management API base URL, e.g. `https://broker.example.com:15671`
    #[serde(default)]
    pub api_url: Option<String>,

    /// AMQP host used in relay URIs (defaults to the API URL host)
    #[serde(default)]
    pub amqp_host: Option<String>,

    /// AMQPS port used in relay URIs
    #[serde(default = "default_central_amqp_port")]
    pub amqp_port: u16,

    /// Management and relay user
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: Secret,
}

impl Default for CentralSettings {
    fn default() -> Self {
        Self {
            api_url: None,
            amqp_host: None,
            amqp_port: default_central_amqp_port(),
            username: default_username(),
            password: Secret::default(),
        }
    }
}

impl CentralSettings {
    /// Host relay links connect to on the central side
    pub fn resolved_amqp_host(&self) -> Option<String> {
        if let Some(host) = &self.amqp_host {
            return Some(host.clone());
        }
        let api_url = self.api_url.as_deref()?;
        url::Url::parse(api_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

fn default_central_amqp_port() -> u16 {
    5671
}

/// Site broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteSettings {
    /// AMQP host of the site-local broker as seen by its own relays
    #[serde(default = "default_site_amqp_host")]
    pub amqp_host: String,

    #[serde(default = "default_site_amqp_port")]
    pub amqp_port: u16,

    /// Administrative user written into the definitions document
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: Secret,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            amqp_host: default_site_amqp_host(),
            amqp_port: default_site_amqp_port(),
            username: default_username(),
            password: Secret::default(),
        }
    }
}

fn default_site_amqp_host() -> String {
    "localhost".to_string()
}
fn default_site_amqp_port() -> u16 {
    5672
}
fn default_username() -> String {
    "admin".to_string()
}

/// HTTP and worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkSettings {
    /// Per-call timeout for management API requests
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Number of sites reconciled concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_concurrency() -> usize {
    4
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Attempt ceiling, first attempt included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    500
}
fn default_max_delay() -> u64 {
    8000
}

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    None,
    FixedDelay,
    #[default]
    ExponentialBackoff,
    LinearBackoff,
}

/// A credential that never shows up in logs or debug output
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plaintext value, for building requests and URIs only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = RelaymeshSettings::default();
        assert_eq!(settings.central.amqp_port, 5671);
        assert_eq!(settings.site.amqp_host, "localhost");
        assert_eq!(settings.site.amqp_port, 5672);
        assert_eq!(settings.network.concurrency, 4);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.output_dir, "definitions");
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let central = CentralSettings {
            password: Secret::new("hunter2"),
            ..CentralSettings::default()
        };
        let rendered = format!("{:?}", central);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("****"));
    }

    #[test]
    fn test_amqp_host_falls_back_to_api_url_host() {
        let central = CentralSettings {
            api_url: Some("https://broker.example.com:15671".into()),
            ..CentralSettings::default()
        };
        assert_eq!(
            central.resolved_amqp_host().as_deref(),
            Some("broker.example.com")
        );

        let explicit = CentralSettings {
            amqp_host: Some("amqp.example.com".into()),
            ..central
        };
        assert_eq!(
            explicit.resolved_amqp_host().as_deref(),
            Some("amqp.example.com")
        );
    }

    #[test]
    fn test_settings_yaml_kebab_case() {
        let yaml = r#"
central:
  api-url: https://broker:15671
  amqp-port: 5677
network:
  http-timeout-secs: 5
retry:
  max-attempts: 2
  strategy: fixed-delay
"#;
        let settings: RelaymeshSettings = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(settings.central.amqp_port, 5677);
        assert_eq!(settings.network.http_timeout_secs, 5);
        assert_eq!(settings.network.concurrency, 4);
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.retry.strategy, RetryStrategy::FixedDelay);
    }

    #[test]
    fn test_output_dir_from_yaml_and_default() {
        let settings: RelaymeshSettings = serde_yaml_ng::from_str("output-dir: out/defs\n").unwrap();
        assert_eq!(settings.output_dir, "out/defs");

        let settings: RelaymeshSettings = serde_yaml_ng::from_str("network: {}\n").unwrap();
        assert_eq!(settings.output_dir, "definitions");
        assert_eq!(RelaymeshSettings::default().output_dir, settings.output_dir);
    }
}
