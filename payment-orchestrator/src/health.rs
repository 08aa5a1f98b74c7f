//! Dependency health aggregator
//!
//! Diagnostics only: the pipeline never consults it before calling a
//! dependency.

use crate::clients::endpoint;
use crate::config::ServicesConfig;
use crate::metrics::HEALTH_PROBES;
use crate::transport::Transport;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Probes `GET {baseUrl}/health` on every configured dependency
pub struct HealthAggregator {
    targets: Vec<(String, String)>, // (service name, base url)
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl HealthAggregator {
    pub fn new(targets: Vec<(String, String)>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            targets,
            transport,
            timeout,
        }
    }

    pub fn from_services(services: &ServicesConfig, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        let targets = vec![
            ("authEngine".to_string(), services.auth_engine_url.clone()),
            ("fraudDetection".to_string(), services.fraud_detection_url.clone()),
            ("acsSimulator".to_string(), services.acs_simulator_url.clone()),
            ("cryptoService".to_string(), services.crypto_service_url.clone()),
        ];
        Self::new(targets, transport, timeout)
    }

    /// Service name to liveness; never fails
    pub async fn get_health(&self) -> BTreeMap<String, bool> {
        let probes = self.targets.iter().map(|(name, base_url)| {
            let transport = self.transport.clone();
            let url = endpoint(base_url, "/health");
            let timeout = self.timeout;
            async move {
                let healthy = match transport.get(&url, timeout).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("{} health check failed: {}", name, e);
                        false
                    }
                };
                HEALTH_PROBES
                    .with_label_values(&[name.as_str(), if healthy { "up" } else { "down" }])
                    .inc();
                (name.clone(), healthy)
            }
        });

        let health: BTreeMap<String, bool> = join_all(probes).await.into_iter().collect();
        debug!("Dependency health: {:?}", health);
        health
    }
}
