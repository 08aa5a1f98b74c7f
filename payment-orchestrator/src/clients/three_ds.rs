use super::{endpoint, FailureMode, ThreeDSService};
use crate::error::Result;
use crate::metrics;
use crate::transport::{post_typed, Transport};
use crate::types::{ThreeDSAuthRequest, ThreeDSResult, TransStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Client for `POST {acsBaseUrl}/authenticate`
pub struct ThreeDSClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl ThreeDSClient {
    pub const FAILURE_MODE: FailureMode = FailureMode::Open;

    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            timeout,
        }
    }

    /// Frictionless approval
    pub fn fallback() -> ThreeDSResult {
        ThreeDSResult {
            eci: Some("06".to_string()),
            ..ThreeDSResult::with_status(TransStatus::Authenticated)
        }
    }
}

#[async_trait]
impl ThreeDSService for ThreeDSClient {
    async fn authenticate(&self, request: &ThreeDSAuthRequest) -> Result<ThreeDSResult> {
        let url = endpoint(&self.base_url, "/authenticate");

        match post_typed::<_, ThreeDSResult>(self.transport.as_ref(), &url, request, self.timeout).await {
            Ok(result) => {
                info!(
                    "3DS authentication for {}: transStatus {}",
                    request.transaction_id, result.trans_status
                );
                Ok(result)
            }
            Err(e) if e.is_unavailable() => {
                warn!(
                    mode = %Self::FAILURE_MODE,
                    "ACS unavailable, returning frictionless approval: {}", e
                );
                metrics::record_fallback("acsSimulator", Self::FAILURE_MODE.as_str());
                Ok(Self::fallback())
            }
            Err(e) => {
                error!("ACS returned an unusable reply: {}", e);
                Err(e.into())
            }
        }
    }
}
