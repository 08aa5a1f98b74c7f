use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use payment_orchestrator::{
    handlers::{self, AppState},
    transport::{HttpTransport, Transport},
    Config, HealthAggregator, Orchestrator,
};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .json()
        .init();

    info!("Starting Payment Orchestrator...");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Services: auth={} fraud={} acs={} crypto={}",
        config.services.auth_engine_url,
        config.services.fraud_detection_url,
        config.services.acs_simulator_url,
        config.services.crypto_service_url
    );
    info!(
        "Policy: fraud decline >= {}, 3DS threshold {}, 3DS enabled {}",
        config.policy.fraud_score_decline_threshold,
        config.policy.three_ds_threshold,
        config.policy.three_ds_enabled
    );

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new().context("Failed to create HTTP transport")?);

    let state = AppState {
        orchestrator: Arc::new(Orchestrator::from_config(&config, transport.clone())),
        health: Arc::new(HealthAggregator::from_services(
            &config.services,
            transport,
            config.timeouts.health(),
        )),
    };

    let server_config = config.server.clone();
    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().limit(64 * 1024))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
