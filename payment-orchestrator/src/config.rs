use crate::error::{OrchestratorError, Result};
use config::{ConfigBuilder, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub services: ServicesConfig,
    pub policy: PolicyConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

/// Base URLs of the decisioning services
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServicesConfig {
    pub auth_engine_url: String,
    pub fraud_detection_url: String,
    pub acs_simulator_url: String,
    pub crypto_service_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PolicyConfig {
    pub fraud_score_decline_threshold: u32,
    pub three_ds_threshold: u64,
    pub three_ds_enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimeoutConfig {
    /// Per-call timeout for fraud, 3DS, authorization and challenge calls
    pub request_ms: u64,
    /// Per-probe timeout for the health aggregator
    pub health_ms: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn health(&self) -> Duration {
        Duration::from_millis(self.health_ms)
    }
}

type Builder = ConfigBuilder<config::builder::DefaultState>;

fn with_defaults() -> std::result::Result<Builder, ConfigError> {
    config::Config::builder()
        // Server defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.workers", 4)?
        // Decisioning services
        .set_default("services.auth_engine_url", "http://sim-auth-engine:8006")?
        .set_default("services.fraud_detection_url", "http://sim-fraud-detection:8007")?
        .set_default("services.acs_simulator_url", "http://acs-simulator:8013")?
        .set_default("services.crypto_service_url", "http://crypto-service:8010")?
        // Decision policy
        .set_default("policy.fraud_score_decline_threshold", 70)?
        .set_default("policy.three_ds_threshold", 100)?
        .set_default("policy.three_ds_enabled", true)?
        // Timeouts
        .set_default("timeouts.request_ms", 10_000)?
        .set_default("timeouts.health_ms", 2_000)
}

impl Config {
    /// Built-in defaults, ignoring the environment
    pub fn defaults() -> Result<Self> {
        let config: Config = with_defaults()?.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut builder =
            with_defaults()?.add_source(Environment::with_prefix("ORCHESTRATOR").separator("__"));

        // Flat overrides used by the simulator deployment
        let overrides = [
            ("SERVICE_PORT", "server.port"),
            ("AUTH_ENGINE_URL", "services.auth_engine_url"),
            ("FRAUD_DETECTION_URL", "services.fraud_detection_url"),
            ("ACS_SIMULATOR_URL", "services.acs_simulator_url"),
            ("CRYPTO_SERVICE_URL", "services.crypto_service_url"),
            ("FRAUD_DECLINE_THRESHOLD", "policy.fraud_score_decline_threshold"),
            ("THREE_DS_THRESHOLD", "policy.three_ds_threshold"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        // Anything but the literal "false" keeps 3DS on
        if let Ok(enabled) = env::var("THREE_DS_ENABLED") {
            builder = builder.set_override("policy.three_ds_enabled", enabled != "false")?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("auth_engine_url", &self.services.auth_engine_url),
            ("fraud_detection_url", &self.services.fraud_detection_url),
            ("acs_simulator_url", &self.services.acs_simulator_url),
            ("crypto_service_url", &self.services.crypto_service_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(OrchestratorError::Configuration(format!("{} must not be empty", name)));
            }
        }

        if self.timeouts.request_ms == 0 || self.timeouts.health_ms == 0 {
            return Err(OrchestratorError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
