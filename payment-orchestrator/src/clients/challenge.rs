use super::{endpoint, ChallengeService, FailureMode};
use crate::error::{OrchestratorError, Result};
use crate::metrics;
use crate::transport::{post_typed, Transport};
use crate::types::{ChallengeVerifyRequest, ThreeDSResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Client for `POST {acsBaseUrl}/challenge/verify`
pub struct ChallengeVerifierClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl ChallengeVerifierClient {
    pub const FAILURE_MODE: FailureMode = FailureMode::Closed;

    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            timeout,
        }
    }
}

#[async_trait]
impl ChallengeService for ChallengeVerifierClient {
    async fn verify(&self, request: &ChallengeVerifyRequest) -> Result<ThreeDSResult> {
        let url = endpoint(&self.base_url, "/challenge/verify");

        match post_typed::<_, ThreeDSResult>(self.transport.as_ref(), &url, request, self.timeout).await {
            Ok(result) => {
                info!(
                    "Challenge verification for {}: transStatus {}",
                    request.acs_trans_id, result.trans_status
                );
                Ok(result)
            }
            Err(e) => {
                error!(
                    mode = %Self::FAILURE_MODE,
                    acs_trans_id = %request.acs_trans_id,
                    "Challenge verification failed: {}", e
                );
                metrics::record_fallback("acsSimulator", Self::FAILURE_MODE.as_str());
                Err(OrchestratorError::Transport(e))
            }
        }
    }
}
