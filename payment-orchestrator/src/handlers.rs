use crate::error::OrchestratorError;
use crate::health::HealthAggregator;
use crate::metrics;
use crate::orchestrator::Orchestrator;
use crate::types::{OrchestratedResult, TransactionRequest};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state handed to every worker
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub health: Arc<HealthAggregator>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyChallengeBody {
    pub acs_trans_id: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_endpoint))
        .service(
            web::scope("/api/v1")
                .route("/transactions", web::post().to(process_transaction))
                .route("/challenge/verify", web::post().to(verify_challenge))
                .route("/integrations/health", web::get().to(integrations_health)),
        );
}

/// Approved results are 200, every decline is 402
fn respond(result: OrchestratedResult) -> HttpResponse {
    if result.approved {
        HttpResponse::Ok().json(result)
    } else {
        HttpResponse::PaymentRequired().json(result)
    }
}

// ===== Health Check =====
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "payment-orchestrator",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ===== Prometheus Metrics =====
pub async fn metrics_endpoint() -> Result<HttpResponse, OrchestratorError> {
    let body = metrics::export()
        .map_err(|e| OrchestratorError::Internal(format!("Failed to export metrics: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Process Transaction =====
pub async fn process_transaction(
    state: web::Data<AppState>,
    req: web::Json<TransactionRequest>,
) -> HttpResponse {
    let result = state.orchestrator.process_transaction(&req).await;
    respond(result)
}

// ===== Verify 3DS Challenge =====
pub async fn verify_challenge(
    state: web::Data<AppState>,
    req: web::Json<VerifyChallengeBody>,
) -> HttpResponse {
    let result = state
        .orchestrator
        .verify_challenge(&req.acs_trans_id, &req.otp)
        .await;
    respond(result)
}

// ===== Dependency Health =====
pub async fn integrations_health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.health.get_health().await)
}
