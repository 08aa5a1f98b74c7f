//! Payment Orchestrator
//!
//! Card-not-present authorization pipeline: fraud scoring, 3-D Secure
//! step-up and final authorization sequenced into a single decision.

#![forbid(unsafe_code)]

pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod orchestrator;
pub mod policy;
pub mod transport;
pub mod types;

pub use crate::config::Config;
pub use error::{OrchestratorError, Result, TransportError};
pub use health::HealthAggregator;
pub use orchestrator::{Orchestrator, Services};
pub use policy::DecisionPolicy;
pub use types::*;
