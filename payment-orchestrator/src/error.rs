//! Error types for the payment orchestrator

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Failure of a single outbound call
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request did not complete within its timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Connection could not be established or was dropped
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Remote answered with a non-2xx status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Request body could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// The remote was unreachable or did not answer 2xx
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connect(_) | TransportError::Status { .. }
        )
    }

    /// Classify a reqwest failure for a call bounded by `timeout_ms`
    pub fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout_ms)
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    }
}

/// Orchestrator error
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Request rejected before any pipeline step ran
    #[error("Validation error: {0}")]
    Validation(String),

    /// Outbound call failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A decisioning service could not produce a result
    #[error("Service error: {0}")]
    Service(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for OrchestratorError {
    fn from(err: config::ConfigError) -> Self {
        OrchestratorError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for OrchestratorError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let messages: Vec<String> = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
            })
            .collect();

        OrchestratorError::Validation(messages.join("; "))
    }
}

impl ResponseError for OrchestratorError {
    fn error_response(&self) -> HttpResponse {
        match self {
            OrchestratorError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "VALIDATION_ERROR",
                "message": self.to_string()
            })),
            OrchestratorError::Transport(_) | OrchestratorError::Service(_) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "DEPENDENCY_UNAVAILABLE",
                    "message": "Service temporarily unavailable"
                }))
            }
            OrchestratorError::Configuration(_) | OrchestratorError::Internal(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "INTERNAL_ERROR",
                    "message": "Internal server error"
                }))
            }
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, OrchestratorError>;
