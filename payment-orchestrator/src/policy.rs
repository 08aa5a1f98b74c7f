//! Decision policy
//!
//! Pure functions: whether to decline on fraud, whether to step up to
//! 3-D Secure, and which response code each business outcome carries.
//! Nothing here performs I/O or keeps state between calls.

use crate::config::PolicyConfig;
use crate::types::{FraudCheckResult, ResponseCode, ThreeDSResult, TransStatus, TransactionRequest};
use rust_decimal::Decimal;

/// Risk score from which 3-D Secure is always requested
pub const MEDIUM_RISK_SCORE: u32 = 30;

/// Business outcomes the pipeline produces without the authorization engine.
///
/// This is the only place their response codes and messages are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FraudDecline,
    ChallengeRequired,
    ThreeDsFailed,
    ChallengeVerified,
    ChallengeFailed,
    ChallengeVerifyError,
    AuthorizationUnavailable,
    SystemError,
}

impl Outcome {
    pub fn response_code(self) -> ResponseCode {
        match self {
            Outcome::FraudDecline => ResponseCode::FraudDecline,
            Outcome::ChallengeRequired => ResponseCode::ChallengeRequired,
            Outcome::ThreeDsFailed | Outcome::ChallengeFailed => ResponseCode::DoNotHonor,
            Outcome::ChallengeVerified => ResponseCode::Approved,
            Outcome::ChallengeVerifyError
            | Outcome::AuthorizationUnavailable
            | Outcome::SystemError => ResponseCode::SystemError,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Outcome::FraudDecline => "Transaction declined - fraud risk detected",
            Outcome::ChallengeRequired => "3D-Secure challenge required",
            Outcome::ThreeDsFailed => "3D-Secure authentication failed",
            Outcome::ChallengeVerified => "Challenge verified",
            Outcome::ChallengeFailed => "Challenge failed",
            Outcome::ChallengeVerifyError => "Challenge verification error",
            Outcome::AuthorizationUnavailable => "Authorization service unavailable",
            Outcome::SystemError => "System error during processing",
        }
    }

    pub fn approved(self) -> bool {
        matches!(self, Outcome::ChallengeVerified)
    }
}

/// What the pipeline does after a 3-D Secure evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreeDsOutcome {
    /// `C`: stop and hand the challenge back to the caller
    ChallengeRequired,
    /// `N`: decline
    Failed,
    /// `Y` or anything else: continue to authorization
    Proceed,
}

/// Thresholds and switches driving the pipeline's branches
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    pub fraud_score_decline_threshold: u32,
    pub three_ds_threshold: Decimal,
    pub three_ds_enabled: bool,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            fraud_score_decline_threshold: 70,
            three_ds_threshold: Decimal::from(100),
            three_ds_enabled: true,
        }
    }
}

impl From<&PolicyConfig> for DecisionPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            fraud_score_decline_threshold: config.fraud_score_decline_threshold,
            three_ds_threshold: Decimal::from(config.three_ds_threshold),
            three_ds_enabled: config.three_ds_enabled,
        }
    }
}

impl DecisionPolicy {
    /// Fraud score at or above the decline threshold
    pub fn should_decline_for_fraud(&self, fraud: &FraudCheckResult) -> bool {
        fraud.risk_score >= self.fraud_score_decline_threshold
    }

    /// E-commerce, amount at or above the 3DS threshold, or medium risk
    pub fn requires_3ds(&self, request: &TransactionRequest, fraud: &FraudCheckResult) -> bool {
        request.is_ecommerce()
            || request.amount >= self.three_ds_threshold
            || fraud.risk_score >= MEDIUM_RISK_SCORE
    }

    /// 3DS is evaluated only when globally enabled and required
    pub fn should_evaluate_3ds(&self, request: &TransactionRequest, fraud: &FraudCheckResult) -> bool {
        self.three_ds_enabled && self.requires_3ds(request, fraud)
    }

    pub fn three_ds_outcome(&self, result: &ThreeDSResult) -> ThreeDsOutcome {
        match result.trans_status {
            TransStatus::ChallengeRequired => ThreeDsOutcome::ChallengeRequired,
            TransStatus::Failed => ThreeDsOutcome::Failed,
            TransStatus::Authenticated | TransStatus::Other(_) => ThreeDsOutcome::Proceed,
        }
    }

    /// Only `Y` verifies a challenge
    pub fn challenge_outcome(&self, result: &ThreeDSResult) -> Outcome {
        if result.trans_status == TransStatus::Authenticated {
            Outcome::ChallengeVerified
        } else {
            Outcome::ChallengeFailed
        }
    }
}
