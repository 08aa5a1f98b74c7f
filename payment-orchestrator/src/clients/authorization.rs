use super::{endpoint, AuthorizationService, FailureMode};
use crate::error::Result;
use crate::metrics;
use crate::policy::Outcome;
use crate::transport::{post_typed, Transport};
use crate::types::{AuthorizationRequest, AuthorizationResult};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Six-digit system trace audit number.
///
/// Drawn from the thread-local RNG, not a cryptographic source: the STAN is
/// a trace aid for the authorization engine's logs, not an idempotency or
/// security key, and collisions between transactions are acceptable.
pub fn generate_stan() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Client for `POST {authBaseUrl}/authorize`
pub struct AuthorizationClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl AuthorizationClient {
    pub const FAILURE_MODE: FailureMode = FailureMode::Closed;

    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            timeout,
        }
    }

    /// Declined with a system error; the ledger of record is never assumed
    /// to have approved
    pub fn fallback() -> AuthorizationResult {
        let outcome = Outcome::AuthorizationUnavailable;
        AuthorizationResult {
            approved: outcome.approved(),
            response_code: outcome.response_code(),
            response_message: outcome.message().to_string(),
            auth_code: None,
        }
    }
}

#[async_trait]
impl AuthorizationService for AuthorizationClient {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<AuthorizationResult> {
        let url = endpoint(&self.base_url, "/authorize");

        match post_typed::<_, AuthorizationResult>(self.transport.as_ref(), &url, request, self.timeout).await {
            Ok(result) => {
                info!(
                    "Authorization STAN {}: {} ({})",
                    request.stan, result.response_code, result.response_message
                );
                Ok(result)
            }
            Err(e) => {
                error!(
                    mode = %Self::FAILURE_MODE,
                    stan = %request.stan,
                    "Auth engine authorization failed: {}", e
                );
                metrics::record_fallback("authEngine", Self::FAILURE_MODE.as_str());
                Ok(Self::fallback())
            }
        }
    }
}
