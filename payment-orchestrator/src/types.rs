//! Core types for the authorization pipeline

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use validator::{Validate, ValidationError};

/// Currency used when the caller does not supply one
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Merchant category code used when the caller does not supply one
pub const DEFAULT_MCC: &str = "5999";

/// Country used when the caller does not supply one
pub const DEFAULT_COUNTRY: &str = "FR";

/// Terminal id sent to the authorization engine when none is supplied
pub const DEFAULT_TERMINAL_ID: &str = "TERM0001";

/// The authorization engine accepts at most 8 characters of terminal id
pub const TERMINAL_ID_MAX_LEN: usize = 8;

lazy_static! {
    static ref PAN_DIGITS: Regex = Regex::new(r"^[0-9]*$").expect("PAN pattern compiles");
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(validation_error("negative_amount", "Amount must not be negative"));
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error("blank", "Merchant id must not be blank"));
    }
    Ok(())
}

/// Card-not-present payment request, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Primary account number
    #[validate(
        length(min = 1, message = "PAN must not be empty"),
        regex(path = "PAN_DIGITS", message = "PAN must be numeric")
    )]
    pub pan: String,

    /// Transaction amount
    #[validate(custom = "validate_non_negative")]
    pub amount: Decimal,

    /// ISO 4217 currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Merchant identifier
    #[validate(custom = "validate_not_blank")]
    pub merchant_id: String,

    /// Terminal identifier, truncated before transmission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_id: Option<String>,

    /// Caller-supplied transaction id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Merchant category code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcc: Option<String>,

    /// Merchant country
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// E-commerce transaction flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ecommerce: Option<bool>,

    /// Part of the caller contract; not consulted by the decision policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_challenge: Option<bool>,
}

impl TransactionRequest {
    /// Create a request with every optional field left unset
    pub fn new(
        pan: impl Into<String>,
        amount: Decimal,
        merchant_id: impl Into<String>,
        terminal_id: impl Into<String>,
    ) -> Self {
        Self {
            pan: pan.into(),
            amount,
            currency: default_currency(),
            merchant_id: merchant_id.into(),
            terminal_id: Some(terminal_id.into()),
            transaction_id: None,
            mcc: None,
            country: None,
            is_ecommerce: None,
            requires_challenge: None,
        }
    }

    /// Mark the request as e-commerce (or not)
    pub fn with_ecommerce(mut self, is_ecommerce: bool) -> Self {
        self.is_ecommerce = Some(is_ecommerce);
        self
    }

    /// Set an explicit transaction id
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Caller-supplied transaction id, or `TXN_<unixMillis>`
    pub fn resolve_transaction_id(&self) -> String {
        match &self.transaction_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("TXN_{}", Utc::now().timestamp_millis()),
        }
    }

    pub fn mcc(&self) -> &str {
        self.mcc.as_deref().unwrap_or(DEFAULT_MCC)
    }

    pub fn country(&self) -> &str {
        self.country.as_deref().unwrap_or(DEFAULT_COUNTRY)
    }

    /// Currency, falling back to EUR when blank
    pub fn currency(&self) -> &str {
        if self.currency.is_empty() {
            DEFAULT_CURRENCY
        } else {
            &self.currency
        }
    }

    pub fn is_ecommerce(&self) -> bool {
        self.is_ecommerce == Some(true)
    }

    /// Terminal id as transmitted to the authorization engine
    pub fn transmitted_terminal_id(&self) -> String {
        match self.terminal_id.as_deref() {
            Some(id) if !id.is_empty() => id.chars().take(TERMINAL_ID_MAX_LEN).collect(),
            _ => DEFAULT_TERMINAL_ID.to_string(),
        }
    }
}

/// Fraud scoring outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudCheckResult {
    /// Risk score, conventionally 0-100
    #[serde(deserialize_with = "deserialize_risk_score")]
    pub risk_score: u32,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub recommendation: String,
}

/// Any JSON number, rounded to the nearest integer and clamped at zero
fn deserialize_risk_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let score = f64::deserialize(deserializer)?;
    if !score.is_finite() {
        return Err(serde::de::Error::custom("risk score must be a finite number"));
    }
    Ok(score.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

/// 3-D Secure transaction status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransStatus {
    /// `Y`
    Authenticated,
    /// `N`
    Failed,
    /// `C`
    ChallengeRequired,
    /// Any other code; the pipeline proceeds to authorization
    Other(String),
}

impl TransStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TransStatus::Authenticated => "Y",
            TransStatus::Failed => "N",
            TransStatus::ChallengeRequired => "C",
            TransStatus::Other(code) => code,
        }
    }
}

impl From<String> for TransStatus {
    fn from(code: String) -> Self {
        match code.as_str() {
            "Y" => TransStatus::Authenticated,
            "N" => TransStatus::Failed,
            "C" => TransStatus::ChallengeRequired,
            _ => TransStatus::Other(code),
        }
    }
}

impl From<&str> for TransStatus {
    fn from(code: &str) -> Self {
        TransStatus::from(code.to_string())
    }
}

impl From<TransStatus> for String {
    fn from(status: TransStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TransStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 3-D Secure authentication outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDSResult {
    pub trans_status: TransStatus,

    /// Electronic Commerce Indicator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eci: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_url: Option<String>,

    /// ACS transaction id, needed to verify a challenge later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acs_trans_id: Option<String>,

    /// CAVV/AAV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

impl ThreeDSResult {
    /// Result carrying only a status
    pub fn with_status(trans_status: impl Into<TransStatus>) -> Self {
        Self {
            trans_status: trans_status.into(),
            eci: None,
            challenge_url: None,
            acs_trans_id: None,
            authentication_value: None,
            protocol_version: None,
        }
    }
}

/// ISO 8583-style response code.
///
/// Codes the pipeline produces itself are closed variants; everything the
/// authorization engine returns that is not one of them is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseCode {
    /// `00`
    Approved,
    /// `05`
    DoNotHonor,
    /// `57`
    FraudDecline,
    /// `65`
    ChallengeRequired,
    /// `96`
    SystemError,
    /// Any other code from the authorization engine
    Engine(String),
}

impl ResponseCode {
    pub fn as_str(&self) -> &str {
        match self {
            ResponseCode::Approved => "00",
            ResponseCode::DoNotHonor => "05",
            ResponseCode::FraudDecline => "57",
            ResponseCode::ChallengeRequired => "65",
            ResponseCode::SystemError => "96",
            ResponseCode::Engine(code) => code,
        }
    }
}

impl From<String> for ResponseCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "00" => ResponseCode::Approved,
            "05" => ResponseCode::DoNotHonor,
            "57" => ResponseCode::FraudDecline,
            "65" => ResponseCode::ChallengeRequired,
            "96" => ResponseCode::SystemError,
            _ => ResponseCode::Engine(code),
        }
    }
}

impl From<&str> for ResponseCode {
    fn from(code: &str) -> Self {
        ResponseCode::from(code.to_string())
    }
}

impl From<ResponseCode> for String {
    fn from(code: ResponseCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization engine outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResult {
    pub approved: bool,
    pub response_code: ResponseCode,
    pub response_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
}

/// The single entity returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratedResult {
    pub approved: bool,
    pub response_code: ResponseCode,
    pub response_message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_check: Option<FraudCheckResult>,

    #[serde(rename = "threeDSResult", default, skip_serializing_if = "Option::is_none")]
    pub three_ds_result: Option<ThreeDSResult>,

    /// Wall-clock milliseconds spent in the call
    pub processing_time: u64,

    /// Ordered stage markers; the audit trail of the call
    pub flow_steps: Vec<String>,
}

/// Stage marker recorded in `flow_steps`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    FraudCheckStart,
    FraudCheckComplete { risk_level: String },
    ThreeDsCheckStart,
    ThreeDsCheckComplete { trans_status: TransStatus },
    AuthorizationStart,
    AuthorizationComplete { response_code: ResponseCode },
    Error { message: String },
    ChallengeVerify,
    ChallengeVerifyError,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStep::FraudCheckStart => write!(f, "FRAUD_CHECK_START"),
            FlowStep::FraudCheckComplete { risk_level } => {
                write!(f, "FRAUD_CHECK_COMPLETE: {}", risk_level)
            }
            FlowStep::ThreeDsCheckStart => write!(f, "3DS_CHECK_START"),
            FlowStep::ThreeDsCheckComplete { trans_status } => {
                write!(f, "3DS_CHECK_COMPLETE: {}", trans_status)
            }
            FlowStep::AuthorizationStart => write!(f, "AUTHORIZATION_START"),
            FlowStep::AuthorizationComplete { response_code } => {
                write!(f, "AUTHORIZATION_COMPLETE: {}", response_code)
            }
            FlowStep::Error { message } => write!(f, "ERROR: {}", message),
            FlowStep::ChallengeVerify => write!(f, "CHALLENGE_VERIFY"),
            FlowStep::ChallengeVerifyError => write!(f, "CHALLENGE_VERIFY_ERROR"),
        }
    }
}

/// Append-only step log for one call
#[derive(Debug, Clone, Default)]
pub struct FlowTrace {
    steps: Vec<String>,
}

impl FlowTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: FlowStep) {
        self.steps.push(step.to_string());
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<String> {
        self.steps
    }
}

/// Body of `POST {fraudBaseUrl}/check`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudCheckRequest {
    pub pan: String,
    pub amount: Decimal,
    pub merchant_id: String,
    pub mcc: String,
    pub country: String,
}

impl From<&TransactionRequest> for FraudCheckRequest {
    fn from(request: &TransactionRequest) -> Self {
        Self {
            pan: request.pan.clone(),
            amount: request.amount,
            merchant_id: request.merchant_id.clone(),
            mcc: request.mcc().to_string(),
            country: request.country().to_string(),
        }
    }
}

/// Body of `POST {acsBaseUrl}/authenticate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDSAuthRequest {
    pub pan: String,
    pub amount: Decimal,
    pub currency: String,
    pub merchant_id: String,
    pub transaction_id: String,
}

impl ThreeDSAuthRequest {
    pub fn new(request: &TransactionRequest, transaction_id: &str) -> Self {
        Self {
            pan: request.pan.clone(),
            amount: request.amount,
            currency: request.currency().to_string(),
            merchant_id: request.merchant_id.clone(),
            transaction_id: transaction_id.to_string(),
        }
    }
}

/// Location block of an authorization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
}

/// Body of `POST {authBaseUrl}/authorize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// System trace audit number, six digits
    pub stan: String,
    pub pan: String,
    pub amount: Decimal,
    pub currency: String,
    pub merchant_id: String,
    pub terminal_id: String,
    pub mcc: String,
    pub location: Location,
}

impl AuthorizationRequest {
    pub fn new(request: &TransactionRequest, stan: String) -> Self {
        Self {
            stan,
            pan: request.pan.clone(),
            amount: request.amount,
            currency: request.currency().to_string(),
            merchant_id: request.merchant_id.clone(),
            terminal_id: request.transmitted_terminal_id(),
            mcc: request.mcc().to_string(),
            location: Location {
                country: request.country().to_string(),
            },
        }
    }
}

/// Body of `POST {acsBaseUrl}/challenge/verify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeVerifyRequest {
    pub acs_trans_id: String,
    pub otp: String,
}
