//! Decisioning service clients
//!
//! Each client issues exactly one outbound call per invocation. When the
//! call fails (transport error, timeout, non-2xx or undecodable body) the
//! client's [`FailureMode`] decides what the pipeline sees: fraud scoring
//! and 3-D Secure fail open, authorization and challenge verification fail
//! closed.

pub mod authorization;
pub mod challenge;
pub mod fraud;
pub mod three_ds;

pub use authorization::{generate_stan, AuthorizationClient};
pub use challenge::ChallengeVerifierClient;
pub use fraud::FraudClient;
pub use three_ds::ThreeDSClient;

use crate::error::Result;
use crate::types::{
    AuthorizationRequest, AuthorizationResult, ChallengeVerifyRequest, FraudCheckRequest,
    FraudCheckResult, ThreeDSAuthRequest, ThreeDSResult,
};
use async_trait::async_trait;
use std::fmt;

/// How a client answers when its dependency is unreachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Substitute a benign result and let the pipeline continue
    Open,
    /// Assume the worst and decline
    Closed,
}

impl FailureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureMode::Open => "open",
            FailureMode::Closed => "closed",
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FraudService: Send + Sync {
    async fn check(&self, request: &FraudCheckRequest) -> Result<FraudCheckResult>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThreeDSService: Send + Sync {
    async fn authenticate(&self, request: &ThreeDSAuthRequest) -> Result<ThreeDSResult>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<AuthorizationResult>;
}

/// Completes an already-initiated 3DS challenge.
///
/// An `Err` means the ACS could not be reached; the orchestrator closes the
/// transaction with a system error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeService: Send + Sync {
    async fn verify(&self, request: &ChallengeVerifyRequest) -> Result<ThreeDSResult>;
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
