//! Outbound HTTP transport
//!
//! Every decisioning client talks to its service through [`Transport`], so
//! tests can substitute a deterministic fake and each dependency can carry
//! its own timeout.

use crate::error::{OrchestratorError, Result, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body and return the decoded JSON response
    async fn post_json(
        &self,
        url: &str,
        body: Value,
        timeout: Duration,
    ) -> std::result::Result<Value, TransportError>;

    /// GET a URL, succeeding only on a 2xx status
    async fn get(&self, url: &str, timeout: Duration) -> std::result::Result<(), TransportError>;
}

/// [`Transport`] over a shared `reqwest` client
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| OrchestratorError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

fn millis(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: Value,
        timeout: Duration,
    ) -> std::result::Result<Value, TransportError> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, millis(timeout)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::from_reqwest(e, millis(timeout)))
    }

    async fn get(&self, url: &str, timeout: Duration) -> std::result::Result<(), TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, millis(timeout)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::Status { status, body })
        }
    }
}

/// Typed POST on top of a [`Transport`]
pub async fn post_typed<B, R>(
    transport: &dyn Transport,
    url: &str,
    body: &B,
    timeout: Duration,
) -> std::result::Result<R, TransportError>
where
    B: Serialize + ?Sized + Sync,
    R: DeserializeOwned,
{
    let body = serde_json::to_value(body).map_err(|e| TransportError::Encode(e.to_string()))?;
    let value = transport.post_json(url, body, timeout).await?;
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}
