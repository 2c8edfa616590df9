//! In-memory management API
//!
//! PUT answers 201 the first time a path is seen and 204 afterwards;
//! bindings are listed on GET and added on POST. Vhosts listed in
//! `unavailable_vhosts` answer 503 to everything.
//!
//! The first and last request time of every vhost is recorded, so tests can
//! tell which sites were being reconciled at the same time.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

#[derive(Clone, Default)]
pub struct InMemoryBroker {
    objects: Arc<Mutex<BTreeSet<String>>>,
    bindings: Arc<Mutex<BTreeMap<String, Vec<String>>>>,
    unavailable_vhosts: Arc<Mutex<BTreeSet<String>>>,
    activity: Arc<Mutex<BTreeMap<String, (Instant, Instant)>>>,
    latency: Option<Duration>,
}

impl InMemoryBroker {
    pub async fn start() -> (MockServer, Self) {
        Self::mount(Self::default()).await
    }

    /// Every response is held back by `latency`
    pub async fn start_with_latency(latency: Duration) -> (MockServer, Self) {
        Self::mount(Self {
            latency: Some(latency),
            ..Self::default()
        })
        .await
    }

    async fn mount(broker: Self) -> (MockServer, Self) {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(broker.clone())
            .mount(&server)
            .await;
        (server, broker)
    }

    pub fn make_unavailable(&self, vhost: &str) {
        self.unavailable_vhosts
            .lock()
            .unwrap()
            .insert(vhost.to_string());
    }

    pub fn objects(&self) -> BTreeSet<String> {
        self.objects.lock().unwrap().clone()
    }

    pub fn objects_in(&self, vhost: &str) -> usize {
        let marker = format!("/{}/", vhost);
        let vhost_path = format!("/api/vhosts/{}", vhost);
        self.objects()
            .iter()
            .filter(|p| p.contains(&marker) || **p == vhost_path)
            .count()
    }

    /// Vhosts that have received at least one request
    pub fn seen_vhosts(&self) -> BTreeSet<String> {
        self.activity.lock().unwrap().keys().cloned().collect()
    }

    /// Largest number of vhosts whose request windows overlap
    pub fn max_overlapping_vhosts(&self) -> usize {
        let windows: Vec<(Instant, Instant)> =
            self.activity.lock().unwrap().values().copied().collect();
        windows
            .iter()
            .map(|(start, _)| {
                windows
                    .iter()
                    .filter(|(other_start, other_end)| other_start <= start && start <= other_end)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    fn record(&self, vhost: &str) {
        let now = Instant::now();
        self.activity
            .lock()
            .unwrap()
            .entry(vhost.to_string())
            .and_modify(|(_, last)| *last = now)
            .or_insert((now, now));
    }

    fn is_unavailable(&self, vhost: Option<&str>) -> bool {
        vhost
            .map(|vhost| self.unavailable_vhosts.lock().unwrap().contains(vhost))
            .unwrap_or(false)
    }
}

/// `/api/<kind>/<vhost>/...`
fn vhost_of(path: &str) -> Option<&str> {
    path.split('/').nth(3).filter(|segment| !segment.is_empty())
}

impl Respond for InMemoryBroker {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_string();
        let vhost = vhost_of(&path);
        if let Some(vhost) = vhost {
            self.record(vhost);
        }
        if self.is_unavailable(vhost) {
            return ResponseTemplate::new(503).set_body_string("service unavailable");
        }

        let response = match request.method.as_str() {
            "PUT" => {
                if self.objects.lock().unwrap().insert(path) {
                    ResponseTemplate::new(201)
                } else {
                    ResponseTemplate::new(204)
                }
            }
            "GET" if path.starts_with("/api/bindings/") => {
                let keys = self
                    .bindings
                    .lock()
                    .unwrap()
                    .get(&path)
                    .cloned()
                    .unwrap_or_default();
                let listed: Vec<Value> = keys
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
        };
        match self.latency {
            Some(latency) => response.set_delay(latency),
            None => response,
        }
    }
}
