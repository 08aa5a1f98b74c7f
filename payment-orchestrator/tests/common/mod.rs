#![allow(dead_code)]

use async_trait::async_trait;
use payment_orchestrator::error::TransportError;
use payment_orchestrator::transport::{HttpTransport, Transport};
use payment_orchestrator::Config;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Address nothing listens on
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Real HTTP transport that remembers every POST body it sent
pub struct RecordingTransport {
    inner: HttpTransport,
    posts: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HttpTransport::new().expect("HTTP transport"),
            posts: Mutex::new(Vec::new()),
        })
    }

    /// Bodies posted to URLs ending in `path`
    pub fn bodies_for(&self, path: &str) -> Vec<Value> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.ends_with(path))
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_json(&self, url: &str, body: Value, timeout: Duration) -> Result<Value, TransportError> {
        self.posts.lock().unwrap().push((url.to_string(), body.clone()));
        self.inner.post_json(url, body, timeout).await
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<(), TransportError> {
        self.inner.get(url, timeout).await
    }
}

/// Defaults with every service pointed at the given base URLs
pub fn config(fraud: &str, acs: &str, auth: &str, crypto: &str) -> Config {
    let mut config = Config::defaults().expect("default config");
    config.services.fraud_detection_url = fraud.to_string();
    config.services.acs_simulator_url = acs.to_string();
    config.services.auth_engine_url = auth.to_string();
    config.services.crypto_service_url = crypto.to_string();
    config.timeouts.request_ms = 2_000;
    config.timeouts.health_ms = 500;
    config
}
