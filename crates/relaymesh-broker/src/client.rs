//! Management API client
//!
//! Every operation is an "ensure": asserting an object that already exists
//! is a success. Response statuses are classified explicitly:
//!
//! | status | meaning |
//! |---|---|
//! | 201 | created |
//! | 200, 204 | already present |
//! | 409 | duplicate, already present |
//! | 400 "inequivalent" | present with different properties, kept as is |
//! | 401, 403 | credentials refused, not retried |
//! | anything else | transient, retried under the retry policy |

use std::time::Duration;

use async_trait::async_trait;
use relaymesh_core::retry::{ClosurePredicate, RetryError, RetryExecutor, TracingObserver};
use relaymesh_core::types::{RetryPolicy, Secret};
use relaymesh_topology::{BindingDecl, ExchangeDecl, QueueDecl, ShovelValue};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, Result};

/// Result of an ensure-operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnsureOutcome {
    Created,
    Existing,
}

/// Idempotent broker operations used by the reconciler
#[async_trait]
pub trait BrokerApi: Send + Sync {
    /// Ensure a virtual host exists
    async fn ensure_vhost(&self, name: &str) -> Result<EnsureOutcome>;

    /// Ensure an exchange exists in `vhost`
    async fn ensure_exchange(&self, vhost: &str, exchange: &ExchangeDecl) -> Result<EnsureOutcome>;

    /// Ensure a queue exists in `vhost`
    async fn ensure_queue(&self, vhost: &str, queue: &QueueDecl) -> Result<EnsureOutcome>;

    /// Ensure an exchange to queue binding with the given key exists
    async fn ensure_binding(&self, vhost: &str, binding: &BindingDecl) -> Result<EnsureOutcome>;

    /// Ensure a shovel runtime parameter named `name` exists in `vhost`
    async fn ensure_shovel_parameter(
        &self,
        vhost: &str,
        name: &str,
        value: &ShovelValue,
    ) -> Result<EnsureOutcome>;
}

/// Classification of one management API response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Created,
    Existing,
    /// Object exists with different properties
    Inequivalent,
    /// Credentials refused
    Fatal,
    Transient,
}

/// Classify a response status, using the body to recognise inequivalent objects
pub fn classify(status: StatusCode, body: &str) -> ResponseClass {
    match status {
        StatusCode::CREATED => ResponseClass::Created,
        StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::CONFLICT => ResponseClass::Existing,
        StatusCode::BAD_REQUEST if body.contains("inequivalent") => ResponseClass::Inequivalent,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ResponseClass::Fatal,
        _ => ResponseClass::Transient,
    }
}

/// Failure of a single HTTP attempt
#[derive(Debug, Error)]
enum CallError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

impl CallError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }

    fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        !matches!(self.status(), Some(401) | Some(403))
    }
}

/// Connection settings for [`ManagementClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the management API, e.g. `https://broker:15671`
    pub base_url: String,
    pub username: String,
    pub password: Secret,
    /// Timeout of each individual HTTP call
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, password: Secret) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Deserialize)]
struct BindingInfo {
    routing_key: String,
}

/// [`BrokerApi`] over the broker's management HTTP API with basic authentication
///
/// Each client owns its connection pool; batch workers build their own.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: Secret,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ManagementClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ApiError::invalid_url(&config.base_url, e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::invalid_url(&config.base_url, "URL cannot be a base"));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("relaymesh/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base,
            username: config.username,
            password: config.password,
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `<base>/api/<segments>`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::invalid_url(self.base.as_str(), "URL cannot be a base"))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let password = (!self.password.is_empty()).then(|| self.password.expose());
        self.http
            .request(method, url)
            .basic_auth(&self.username, password)
            .timeout(self.timeout)
    }

    /// One write attempt, classified
    async fn write_once(
        &self,
        object: &str,
        method: Method,
        url: Url,
        body: &Value,
    ) -> std::result::Result<EnsureOutcome, CallError> {
        debug!(object, %method, %url, "management API call");

        let response = self
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;
        let status = response.status();
        let text = response.text().await.map_err(CallError::from_reqwest)?;

        match classify(status, &text) {
            ResponseClass::Created => Ok(EnsureOutcome::Created),
            ResponseClass::Existing => Ok(EnsureOutcome::Existing),
            ResponseClass::Inequivalent => {
                warn!(object, body = %text, "object exists with different properties, keeping it");
                Ok(EnsureOutcome::Existing)
            }
            ResponseClass::Fatal | ResponseClass::Transient => Err(CallError::Status {
                status: status.as_u16(),
                body: text,
            }),
        }
    }

    /// One read of the bindings between an exchange and a queue
    async fn binding_keys_once(&self, object: &str, url: Url) -> std::result::Result<Vec<String>, CallError> {
        debug!(object, %url, "management API lookup");

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bindings: Vec<BindingInfo> = response.json().await.map_err(CallError::from_reqwest)?;
        Ok(bindings.into_iter().map(|b| b.routing_key).collect())
    }

    /// Run one call under the retry policy
    async fn with_retry<T, F, Fut>(&self, object: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, CallError>>,
    {
        let executor = RetryExecutor::new(self.retry.clone())
            .with_predicate(ClosurePredicate::new(|e: &CallError| e.is_retryable()))
            .with_observer(TracingObserver::new(object));

        executor.execute(op).await.map_err(|err| match err {
            RetryError::NonRetryable { source, .. } => ApiError::Rejected {
                object: object.to_string(),
                status: source.status().unwrap_or_default(),
            },
            RetryError::Exhausted {
                attempts, source, ..
            } => ApiError::reconciliation(object, source.status(), attempts, source.to_string()),
        })
    }

    async fn put(&self, object: &str, segments: &[&str], body: Value) -> Result<EnsureOutcome> {
        let url = self.endpoint(segments)?;
        self.with_retry(object, || self.write_once(object, Method::PUT, url.clone(), &body))
            .await
    }
}

#[async_trait]
impl BrokerApi for ManagementClient {
    async fn ensure_vhost(&self, name: &str) -> Result<EnsureOutcome> {
        let object = format!("vhost {}", name);
        self.put(&object, &["vhosts", name], json!({})).await
    }

    async fn ensure_exchange(&self, vhost: &str, exchange: &ExchangeDecl) -> Result<EnsureOutcome> {
        let object = format!("exchange {}/{}", vhost, exchange.name);
        let body = json!({
            "type": exchange.exchange_type,
            "durable": exchange.durable,
            "auto_delete": exchange.auto_delete,
            "internal": false,
            "arguments": {},
        });
        self.put(&object, &["exchanges", vhost, &exchange.name], body)
            .await
    }

    async fn ensure_queue(&self, vhost: &str, queue: &QueueDecl) -> Result<EnsureOutcome> {
        let object = format!("queue {}/{}", vhost, queue.name);
        let body = json!({
            "durable": queue.durable,
            "auto_delete": queue.auto_delete,
            "arguments": {},
        });
        self.put(&object, &["queues", vhost, &queue.name], body).await
    }

    async fn ensure_binding(&self, vhost: &str, binding: &BindingDecl) -> Result<EnsureOutcome> {
        let object = format!(
            "binding {}/{} -> {} ({})",
            vhost, binding.source, binding.destination, binding.routing_key
        );
        let url = self.endpoint(&[
            "bindings",
            vhost,
            "e",
            &binding.source,
            "q",
            &binding.destination,
        ])?;

        // Binding creation is a POST; look first so re-runs report the binding as existing.
        let keys = self
            .with_retry(&object, || self.binding_keys_once(&object, url.clone()))
            .await?;
        if keys.iter().any(|k| *k == binding.routing_key) {
            debug!(object = %object, "binding already present");
            return Ok(EnsureOutcome::Existing);
        }

        let body = json!({ "routing_key": binding.routing_key, "arguments": {} });
        self.with_retry(&object, || {
            self.write_once(&object, Method::POST, url.clone(), &body)
        })
        .await
    }

    async fn ensure_shovel_parameter(
        &self,
        vhost: &str,
        name: &str,
        value: &ShovelValue,
    ) -> Result<EnsureOutcome> {
        let object = format!("shovel {}/{}", vhost, name);
        let body = json!({
            "component": "shovel",
            "vhost": vhost,
            "name": name,
            "value": value,
        });
        self.put(&object, &["parameters", "shovel", vhost, name], body)
            .await
    }
}
