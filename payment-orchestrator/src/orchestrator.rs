//! Transaction authorization orchestrator
//!
//! Sequences fraud scoring, conditional 3-D Secure and authorization for a
//! single card-not-present transaction:
//!
//! ```text
//! Initiated -> FraudChecked -> DeclinedFraud
//!                           -> ThreeDsEvaluated -> ChallengeRequired
//!                                               -> Declined3ds
//!                                               -> Authorized
//!                           -> Authorized          (3DS skipped)
//! ```
//!
//! Stages run strictly in order because each branch depends on the previous
//! stage's output. The orchestrator holds no per-call state, so one instance
//! is shared by every concurrent caller.

use crate::clients::{
    generate_stan, AuthorizationClient, AuthorizationService, ChallengeService,
    ChallengeVerifierClient, FraudClient, FraudService, ThreeDSClient, ThreeDSService,
};
use crate::config::Config;
use crate::error::Result;
use crate::metrics;
use crate::policy::{DecisionPolicy, Outcome, ThreeDsOutcome};
use crate::transport::Transport;
use crate::types::{
    AuthorizationRequest, ChallengeVerifyRequest, FlowStep, FlowTrace, FraudCheckRequest,
    FraudCheckResult, OrchestratedResult, ResponseCode, ThreeDSAuthRequest, ThreeDSResult,
    TransactionRequest,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use validator::Validate;

/// The decisioning services the pipeline calls
#[derive(Clone)]
pub struct Services {
    pub fraud: Arc<dyn FraudService>,
    pub three_ds: Arc<dyn ThreeDSService>,
    pub authorization: Arc<dyn AuthorizationService>,
    pub challenge: Arc<dyn ChallengeService>,
}

impl Services {
    /// HTTP clients for every configured service over one shared transport
    pub fn http(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let services = &config.services;
        let timeout = config.timeouts.request();

        Self {
            fraud: Arc::new(FraudClient::new(
                services.fraud_detection_url.clone(),
                transport.clone(),
                timeout,
            )),
            three_ds: Arc::new(ThreeDSClient::new(
                services.acs_simulator_url.clone(),
                transport.clone(),
                timeout,
            )),
            authorization: Arc::new(AuthorizationClient::new(
                services.auth_engine_url.clone(),
                transport.clone(),
                timeout,
            )),
            challenge: Arc::new(ChallengeVerifierClient::new(
                services.acs_simulator_url.clone(),
                transport,
                timeout,
            )),
        }
    }
}

/// Pipeline position of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Initiated,
    FraudChecked,
    DeclinedFraud,
    ThreeDsEvaluated,
    ChallengeRequired,
    Declined3ds,
    Authorized,
}

/// Outcome of the pipeline before timing and trace are attached
struct Decision {
    approved: bool,
    response_code: ResponseCode,
    response_message: String,
    auth_code: Option<String>,
    fraud_check: Option<FraudCheckResult>,
    three_ds_result: Option<ThreeDSResult>,
}

impl Decision {
    fn from_outcome(
        outcome: Outcome,
        fraud_check: Option<FraudCheckResult>,
        three_ds_result: Option<ThreeDSResult>,
    ) -> Self {
        Self {
            approved: outcome.approved(),
            response_code: outcome.response_code(),
            response_message: outcome.message().to_string(),
            auth_code: None,
            fraud_check,
            three_ds_result,
        }
    }

    fn finish(self, trace: FlowTrace, started: Instant) -> OrchestratedResult {
        OrchestratedResult {
            approved: self.approved,
            response_code: self.response_code,
            response_message: self.response_message,
            auth_code: self.auth_code,
            fraud_check: self.fraud_check,
            three_ds_result: self.three_ds_result,
            processing_time: started.elapsed().as_millis() as u64,
            flow_steps: trace.into_steps(),
        }
    }
}

pub struct Orchestrator {
    services: Services,
    policy: DecisionPolicy,
}

impl Orchestrator {
    pub fn new(services: Services, policy: DecisionPolicy) -> Self {
        Self { services, policy }
    }

    /// HTTP-backed orchestrator for the given configuration
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            Services::http(config, transport),
            DecisionPolicy::from(&config.policy),
        )
    }

    /// Run the full pipeline; always returns a well-formed result
    pub async fn process_transaction(&self, request: &TransactionRequest) -> OrchestratedResult {
        let started = Instant::now();
        let transaction_id = request.resolve_transaction_id();
        let span = info_span!("transaction", id = %transaction_id);
        let mut trace = FlowTrace::new();
        let mut states = vec![PipelineState::Initiated];

        info!(parent: &span, "Processing transaction {}", transaction_id);

        let outcome = self
            .run_pipeline(request, &transaction_id, &mut trace, &mut states)
            .instrument(span.clone())
            .await;

        let result = match outcome {
            Ok(decision) => decision.finish(trace, started),
            Err(e) => {
                error!(parent: &span, "Transaction {} failed: {}", transaction_id, e);
                trace.record(FlowStep::Error {
                    message: e.to_string(),
                });
                // Fraud and 3DS results computed before the fault are dropped
                Decision::from_outcome(Outcome::SystemError, None, None).finish(trace, started)
            }
        };

        info!(
            parent: &span,
            approved = result.approved,
            response_code = %result.response_code,
            final_state = ?states.last(),
            processing_time_ms = result.processing_time,
            "Transaction {} complete", transaction_id
        );
        metrics::record_transaction(
            result.response_code.as_str(),
            result.approved,
            started.elapsed().as_secs_f64(),
        );

        result
    }

    async fn run_pipeline(
        &self,
        request: &TransactionRequest,
        transaction_id: &str,
        trace: &mut FlowTrace,
        states: &mut Vec<PipelineState>,
    ) -> Result<Decision> {
        request.validate()?;

        // Fraud check always runs first
        trace.record(FlowStep::FraudCheckStart);
        let fraud = self.services.fraud.check(&FraudCheckRequest::from(request)).await?;
        trace.record(FlowStep::FraudCheckComplete {
            risk_level: fraud.risk_level.clone(),
        });
        advance(states, PipelineState::FraudChecked);

        if self.policy.should_decline_for_fraud(&fraud) {
            warn!(
                "Declining {}: risk score {} >= {}",
                transaction_id, fraud.risk_score, self.policy.fraud_score_decline_threshold
            );
            advance(states, PipelineState::DeclinedFraud);
            return Ok(Decision::from_outcome(Outcome::FraudDecline, Some(fraud), None));
        }

        let mut three_ds = None;
        if self.policy.should_evaluate_3ds(request, &fraud) {
            trace.record(FlowStep::ThreeDsCheckStart);
            let result = self
                .services
                .three_ds
                .authenticate(&ThreeDSAuthRequest::new(request, transaction_id))
                .await?;
            trace.record(FlowStep::ThreeDsCheckComplete {
                trans_status: result.trans_status.clone(),
            });
            advance(states, PipelineState::ThreeDsEvaluated);

            match self.policy.three_ds_outcome(&result) {
                ThreeDsOutcome::ChallengeRequired => {
                    advance(states, PipelineState::ChallengeRequired);
                    return Ok(Decision::from_outcome(
                        Outcome::ChallengeRequired,
                        Some(fraud),
                        Some(result),
                    ));
                }
                ThreeDsOutcome::Failed => {
                    advance(states, PipelineState::Declined3ds);
                    return Ok(Decision::from_outcome(
                        Outcome::ThreeDsFailed,
                        Some(fraud),
                        Some(result),
                    ));
                }
                ThreeDsOutcome::Proceed => three_ds = Some(result),
            }
        }

        trace.record(FlowStep::AuthorizationStart);
        let authorization = self
            .services
            .authorization
            .authorize(&AuthorizationRequest::new(request, generate_stan()))
            .await?;
        trace.record(FlowStep::AuthorizationComplete {
            response_code: authorization.response_code.clone(),
        });
        advance(states, PipelineState::Authorized);

        Ok(Decision {
            approved: authorization.approved,
            response_code: authorization.response_code,
            response_message: authorization.response_message,
            auth_code: authorization.auth_code,
            fraud_check: Some(fraud),
            three_ds_result: three_ds,
        })
    }

    /// Complete a 3DS challenge issued by an earlier `65` response.
    ///
    /// Independent of the main pipeline; the caller correlates through the
    /// ACS transaction id.
    pub async fn verify_challenge(&self, acs_trans_id: &str, otp: &str) -> OrchestratedResult {
        let started = Instant::now();
        let mut trace = FlowTrace::new();

        let decision = if acs_trans_id.trim().is_empty() || otp.trim().is_empty() {
            warn!("Challenge verification rejected: missing acsTransId or otp");
            trace.record(FlowStep::ChallengeVerifyError);
            Decision::from_outcome(Outcome::ChallengeVerifyError, None, None)
        } else {
            let request = ChallengeVerifyRequest {
                acs_trans_id: acs_trans_id.to_string(),
                otp: otp.to_string(),
            };

            match self.services.challenge.verify(&request).await {
                Ok(result) => {
                    trace.record(FlowStep::ChallengeVerify);
                    let outcome = self.policy.challenge_outcome(&result);
                    info!("Challenge {} verified: {:?}", acs_trans_id, outcome);
                    Decision::from_outcome(outcome, None, Some(result))
                }
                Err(e) => {
                    error!("Challenge verification for {} failed: {}", acs_trans_id, e);
                    trace.record(FlowStep::ChallengeVerifyError);
                    Decision::from_outcome(Outcome::ChallengeVerifyError, None, None)
                }
            }
        };

        let result = decision.finish(trace, started);
        metrics::CHALLENGE_VERIFICATIONS
            .with_label_values(&[result.response_code.as_str()])
            .inc();
        result
    }
}

fn advance(states: &mut Vec<PipelineState>, to: PipelineState) {
    debug!("Pipeline state {:?} -> {:?}", states.last(), to);
    states.push(to);
}
