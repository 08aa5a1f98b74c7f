use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use lazy_static::lazy_static;

lazy_static! {
    // Pipeline metrics
    pub static ref TRANSACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("orchestrator_transactions_total", "Transactions processed by response code"),
        &["response_code", "approved"]
    ).expect("metric can be created");

    pub static ref PROCESSING_TIME: Histogram = Histogram::with_opts(
        HistogramOpts::new("orchestrator_processing_seconds", "End-to-end pipeline duration in seconds")
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 10.0, 30.0])
    ).expect("metric can be created");

    pub static ref CHALLENGE_VERIFICATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("orchestrator_challenge_verifications_total", "3DS challenge verifications by response code"),
        &["response_code"]
    ).expect("metric can be created");

    // Dependency metrics
    pub static ref CLIENT_FALLBACKS: IntCounterVec = IntCounterVec::new(
        Opts::new("orchestrator_client_fallbacks_total", "Calls answered by a client fallback"),
        &["service", "mode"]
    ).expect("metric can be created");

    pub static ref HEALTH_PROBES: IntCounterVec = IntCounterVec::new(
        Opts::new("orchestrator_health_probes_total", "Dependency health probes by outcome"),
        &["service", "status"]
    ).expect("metric can be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_metrics(&registry).expect("metrics can be registered");
        registry
    };
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(TRANSACTIONS_TOTAL.clone()))?;
    registry.register(Box::new(PROCESSING_TIME.clone()))?;
    registry.register(Box::new(CHALLENGE_VERIFICATIONS.clone()))?;
    registry.register(Box::new(CLIENT_FALLBACKS.clone()))?;
    registry.register(Box::new(HEALTH_PROBES.clone()))?;
    Ok(())
}

pub fn record_transaction(response_code: &str, approved: bool, elapsed_secs: f64) {
    TRANSACTIONS_TOTAL
        .with_label_values(&[response_code, if approved { "true" } else { "false" }])
        .inc();
    PROCESSING_TIME.observe(elapsed_secs);
}

pub fn record_fallback(service: &str, mode: &str) {
    CLIENT_FALLBACKS.with_label_values(&[service, mode]).inc();
}

/// Generate metrics output in Prometheus text format
pub fn export() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
