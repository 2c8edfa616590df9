//! Mock management API helpers
//!
//! Single-endpoint helpers mount fixed responses; [`InMemoryBroker`] keeps
//! object state so repeated applies see what earlier ones created.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Respond to `verb path` with a fixed status
pub async fn mock_status(server: &MockServer, verb: &str, api_path: &str, status: u16) {
    Mock::given(method(verb))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Respond with a status and body
pub async fn mock_status_body(server: &MockServer, verb: &str, api_path: &str, status: u16, body: &str) {
    Mock::given(method(verb))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// First `fail_count` calls answer 503, later ones `status`
pub async fn mock_flaky(server: &MockServer, verb: &str, api_path: &str, fail_count: u64, status: u16) {
    Mock::given(method(verb))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method(verb))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of requests the server received with `verb`
pub async fn count_requests(server: &MockServer, verb: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb)
        .count()
}

/// Management API keeping vhosts, exchanges, queues, bindings and parameters in memory
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    objects: Arc<Mutex<BTreeSet<String>>>,
    bindings: Arc<Mutex<BTreeMap<String, Vec<String>>>>,
}

impl InMemoryBroker {
    pub async fn mount(&self, server: &MockServer) {
        Mock::given(any())
            .respond_with(self.clone())
            .mount(server)
            .await;
    }

    /// Objects created through PUT, keyed by request path
    pub fn objects(&self) -> BTreeSet<String> {
        self.objects.lock().unwrap().clone()
    }

    /// Routing keys bound between the exchange and queue of a bindings path
    pub fn binding_keys(&self, bindings_path: &str) -> Vec<String> {
        self.bindings
            .lock()
            .unwrap()
            .get(bindings_path)
            .cloned()
            .unwrap_or_default()
    }
}

impl Respond for InMemoryBroker {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_string();
        match request.method.as_str() {
            "PUT" => {
                if self.objects.lock().unwrap().insert(path) {
                    ResponseTemplate::new(201)
                } else {
                    ResponseTemplate::new(204)
                }
            }
            "GET" if path.starts_with("/api/bindings/") => {
                let listed: Vec<Value> = self
                    .binding_keys(&path)
                    .into_iter()
                    .map(|key| json!({ "routing_key": key }))
                    .collect();
                ResponseTemplate::new(200).set_body_json(listed)
            }
            "POST" if path.starts_with("/api/bindings/") => {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
                let key = body["routing_key"].as_str().unwrap_or_default().to_string();
                let mut bindings = self.bindings.lock().unwrap();
                let keys = bindings.entry(path).or_default();
                if !keys.contains(&key) {
                    keys.push(key);
                }
                ResponseTemplate::new(201)
            }
            _ => ResponseTemplate::new(404),
        }
    }
}
