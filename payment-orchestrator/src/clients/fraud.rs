use super::{endpoint, FailureMode, FraudService};
use crate::error::Result;
use crate::metrics;
use crate::transport::{post_typed, Transport};
use crate::types::{FraudCheckRequest, FraudCheckResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Client for `POST {fraudBaseUrl}/check`
pub struct FraudClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl FraudClient {
    pub const FAILURE_MODE: FailureMode = FailureMode::Open;

    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            timeout,
        }
    }

    /// Low risk, approve
    pub fn fallback() -> FraudCheckResult {
        FraudCheckResult {
            risk_score: 0,
            risk_level: "LOW".to_string(),
            recommendation: "APPROVE".to_string(),
        }
    }
}

#[async_trait]
impl FraudService for FraudClient {
    async fn check(&self, request: &FraudCheckRequest) -> Result<FraudCheckResult> {
        let url = endpoint(&self.base_url, "/check");

        match post_typed::<_, FraudCheckResult>(self.transport.as_ref(), &url, request, self.timeout).await {
            Ok(result) => {
                info!(
                    "Fraud check for merchant {}: score {} ({})",
                    request.merchant_id, result.risk_score, result.risk_level
                );
                Ok(result)
            }
            Err(e) if e.is_unavailable() => {
                error!(
                    mode = %Self::FAILURE_MODE,
                    "Fraud service check failed, assuming low risk: {}", e
                );
                metrics::record_fallback("fraudDetection", Self::FAILURE_MODE.as_str());
                Ok(Self::fallback())
            }
            // A 2xx reply that cannot be read is never treated as low risk
            Err(e) => {
                error!("Fraud service returned an unusable reply: {}", e);
                Err(e.into())
            }
        }
    }
}
