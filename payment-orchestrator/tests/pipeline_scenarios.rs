//! End-to-end pipeline scenarios against mock decisioning services
//!
//! Each service is an `httpmock` server; the orchestrator talks to them over
//! the real HTTP transport.

mod common;

use common::{config, RecordingTransport, UNREACHABLE};
use httpmock::prelude::*;
use payment_orchestrator::{Orchestrator, ResponseCode, TransStatus, TransactionRequest};
use regex::Regex;
use rust_decimal_macros::dec;
use serde_json::json;

fn scenario_request(amount: rust_decimal::Decimal) -> TransactionRequest {
    TransactionRequest::new("4111111111111111", amount, "M1", "T1")
}

fn fraud_response(score: u32, level: &str) -> serde_json::Value {
    json!({"riskScore": score, "riskLevel": level, "recommendation": "APPROVE"})
}

fn approval() -> serde_json::Value {
    json!({
        "approved": true,
        "responseCode": "00",
        "responseMessage": "Approved",
        "authCode": "AB12CD"
    })
}

#[tokio::test]
async fn test_low_risk_without_3ds_is_authorized() {
    let fraud = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    let fraud_mock = fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(fraud_response(10, "LOW"));
        })
        .await;
    let auth_mock = auth
        .mock_async(|when, then| {
            when.method(POST).path("/authorize");
            then.status(200).json_body(approval());
        })
        .await;

    let mut config = config(&fraud.base_url(), UNREACHABLE, &auth.base_url(), UNREACHABLE);
    config.policy.three_ds_enabled = false;
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(50))).await;

    fraud_mock.assert_async().await;
    auth_mock.assert_async().await;
    assert!(result.approved);
    assert_eq!(result.auth_code.as_deref(), Some("AB12CD"));
    assert!(result.three_ds_result.is_none());
}

#[tokio::test]
async fn test_high_risk_never_reaches_authorization() {
    let fraud = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(fraud_response(85, "HIGH"));
        })
        .await;
    let auth_mock = auth
        .mock_async(|when, then| {
            when.method(POST).path("/authorize");
            then.status(200).json_body(approval());
        })
        .await;

    let mut config = config(&fraud.base_url(), UNREACHABLE, &auth.base_url(), UNREACHABLE);
    config.policy.three_ds_enabled = false;
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(50))).await;

    assert_eq!(auth_mock.hits_async().await, 0);
    assert!(!result.approved);
    assert_eq!(result.response_code, ResponseCode::FraudDecline);
    assert!(result.three_ds_result.is_none());
}

#[tokio::test]
async fn test_frictionless_3ds_then_authorization_with_stan() {
    let fraud = MockServer::start_async().await;
    let acs = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(fraud_response(10, "LOW"));
        })
        .await;
    let acs_mock = acs
        .mock_async(|when, then| {
            when.method(POST)
                .path("/authenticate")
                .json_body_partial(json!({"merchantId": "M1", "currency": "EUR"}).to_string());
            then.status(200).json_body(json!({"transStatus": "Y", "eci": "06"}));
        })
        .await;
    let auth_mock = auth
        .mock_async(|when, then| {
            when.method(POST)
                .path("/authorize")
                .json_body_partial(json!({"terminalId": "T1", "location": {"country": "FR"}}).to_string());
            then.status(200).json_body(approval());
        })
        .await;

    let transport = RecordingTransport::new();
    let config = config(&fraud.base_url(), &acs.base_url(), &auth.base_url(), UNREACHABLE);
    let orchestrator = Orchestrator::from_config(&config, transport.clone());

    let result = orchestrator.process_transaction(&scenario_request(dec!(150))).await;

    acs_mock.assert_async().await;
    auth_mock.assert_async().await;
    assert!(result.approved);
    assert_eq!(
        result.three_ds_result.map(|r| r.trans_status),
        Some(TransStatus::Authenticated)
    );

    let stan_format = Regex::new(r"^[0-9]{6}$").unwrap();
    let authorizations = transport.bodies_for("/authorize");
    assert_eq!(authorizations.len(), 1);
    assert!(stan_format.is_match(authorizations[0]["stan"].as_str().unwrap()));
}

#[tokio::test]
async fn test_unreachable_authorization_fails_closed() {
    let fraud = MockServer::start_async().await;
    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(fraud_response(10, "LOW"));
        })
        .await;

    let mut config = config(&fraud.base_url(), UNREACHABLE, UNREACHABLE, UNREACHABLE);
    config.policy.three_ds_enabled = false;
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(50))).await;

    assert!(!result.approved);
    assert_eq!(result.response_code.as_str(), "96");
    assert_eq!(result.response_message, "Authorization service unavailable");
}

#[tokio::test]
async fn test_unreachable_fraud_and_acs_fail_open() {
    let auth = MockServer::start_async().await;
    let auth_mock = auth
        .mock_async(|when, then| {
            when.method(POST).path("/authorize");
            then.status(200).json_body(approval());
        })
        .await;

    let config = config(UNREACHABLE, UNREACHABLE, &auth.base_url(), UNREACHABLE);
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator
        .process_transaction(&scenario_request(dec!(20)).with_ecommerce(true))
        .await;

    auth_mock.assert_async().await;
    assert!(result.approved);
    assert_eq!(result.fraud_check.map(|f| f.risk_score), Some(0));
    let three_ds = result.three_ds_result.expect("3DS evaluated for e-commerce");
    assert_eq!(three_ds.eci.as_deref(), Some("06"));
    assert_eq!(
        result.flow_steps,
        vec![
            "FRAUD_CHECK_START",
            "FRAUD_CHECK_COMPLETE: LOW",
            "3DS_CHECK_START",
            "3DS_CHECK_COMPLETE: Y",
            "AUTHORIZATION_START",
            "AUTHORIZATION_COMPLETE: 00",
        ]
    );
}

#[tokio::test]
async fn test_acs_error_status_falls_back_to_frictionless() {
    let fraud = MockServer::start_async().await;
    let acs = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(fraud_response(45, "MEDIUM"));
        })
        .await;
    acs.mock_async(|when, then| {
        when.method(POST).path("/authenticate");
        then.status(500).json_body(json!({"transStatus": "U", "error": "boom"}));
    })
    .await;
    auth.mock_async(|when, then| {
        when.method(POST).path("/authorize");
        then.status(200).json_body(approval());
    })
    .await;

    let config = config(&fraud.base_url(), &acs.base_url(), &auth.base_url(), UNREACHABLE);
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(10))).await;

    assert!(result.approved);
    assert_eq!(
        result.three_ds_result.map(|r| r.trans_status),
        Some(TransStatus::Authenticated)
    );
}

#[tokio::test]
async fn test_challenge_then_verification() {
    let fraud = MockServer::start_async().await;
    let acs = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(fraud_response(10, "LOW"));
        })
        .await;
    acs.mock_async(|when, then| {
        when.method(POST).path("/authenticate");
        then.status(200).json_body(json!({
            "transStatus": "C",
            "challengeUrl": "http://localhost:3005/3ds-challenge?txId=TXN_1",
            "acsTransId": "ACS123"
        }));
    })
    .await;
    let verify_mock = acs
        .mock_async(|when, then| {
            when.method(POST)
                .path("/challenge/verify")
                .json_body(json!({"acsTransId": "ACS123", "otp": "000000"}));
            then.status(200).json_body(json!({"transStatus": "Y", "eci": "05"}));
        })
        .await;
    let auth_mock = auth
        .mock_async(|when, then| {
            when.method(POST).path("/authorize");
            then.status(200).json_body(approval());
        })
        .await;

    let config = config(&fraud.base_url(), &acs.base_url(), &auth.base_url(), UNREACHABLE);
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let challenged = orchestrator
        .process_transaction(&scenario_request(dec!(250)).with_transaction_id("TXN_1"))
        .await;
    assert_eq!(challenged.response_code, ResponseCode::ChallengeRequired);
    assert!(!challenged.approved);
    let acs_trans_id = challenged
        .three_ds_result
        .and_then(|r| r.acs_trans_id)
        .expect("ACS transaction id returned with the challenge");
    assert_eq!(auth_mock.hits_async().await, 0);

    let verified = orchestrator.verify_challenge(&acs_trans_id, "000000").await;

    verify_mock.assert_async().await;
    assert!(verified.approved);
    assert_eq!(verified.response_code.as_str(), "00");
    assert_eq!(verified.flow_steps, vec!["CHALLENGE_VERIFY"]);
}

#[tokio::test]
async fn test_verification_against_unreachable_acs() {
    let config = config(UNREACHABLE, UNREACHABLE, UNREACHABLE, UNREACHABLE);
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.verify_challenge("ACS123", "000000").await;

    assert!(!result.approved);
    assert_eq!(result.response_code, ResponseCode::SystemError);
    assert_eq!(result.flow_steps, vec!["CHALLENGE_VERIFY_ERROR"]);
}

#[tokio::test]
async fn test_partial_fraud_reply_still_declines() {
    let fraud = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(json!({"riskScore": 85.0, "riskLevel": "HIGH"}));
        })
        .await;
    let auth_mock = auth
        .mock_async(|when, then| {
            when.method(POST).path("/authorize");
            then.status(200).json_body(approval());
        })
        .await;

    let mut config = config(&fraud.base_url(), UNREACHABLE, &auth.base_url(), UNREACHABLE);
    config.policy.three_ds_enabled = false;
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(50))).await;

    assert_eq!(auth_mock.hits_async().await, 0);
    assert!(!result.approved);
    assert_eq!(result.response_code.as_str(), "57");
    assert_eq!(result.fraud_check.map(|f| f.risk_score), Some(85));
}

#[tokio::test]
async fn test_fraud_reply_without_score_is_a_system_error() {
    let fraud = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(json!({"riskLevel": "HIGH", "recommendation": "DECLINE"}));
        })
        .await;
    let auth_mock = auth
        .mock_async(|when, then| {
            when.method(POST).path("/authorize");
            then.status(200).json_body(approval());
        })
        .await;

    let mut config = config(&fraud.base_url(), UNREACHABLE, &auth.base_url(), UNREACHABLE);
    config.policy.three_ds_enabled = false;
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(50))).await;

    assert_eq!(auth_mock.hits_async().await, 0);
    assert!(!result.approved);
    assert_eq!(result.response_code, ResponseCode::SystemError);
    assert!(result.fraud_check.is_none());
}

#[tokio::test]
async fn test_partial_authorization_reply_fails_closed() {
    let fraud = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200).json_body(fraud_response(10, "LOW"));
        })
        .await;
    auth.mock_async(|when, then| {
        when.method(POST).path("/authorize");
        then.status(200).json_body(json!({"approved": true, "responseCode": "00"}));
    })
    .await;

    let mut config = config(&fraud.base_url(), UNREACHABLE, &auth.base_url(), UNREACHABLE);
    config.policy.three_ds_enabled = false;
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(50))).await;

    assert!(!result.approved);
    assert_eq!(result.response_code.as_str(), "96");
    assert_eq!(result.response_message, "Authorization service unavailable");
    assert!(result.auth_code.is_none());
}

#[tokio::test]
async fn test_processing_time_covers_slow_dependency() {
    let fraud = MockServer::start_async().await;
    let auth = MockServer::start_async().await;

    fraud
        .mock_async(|when, then| {
            when.method(POST).path("/check");
            then.status(200)
                .json_body(fraud_response(10, "LOW"))
                .delay(std::time::Duration::from_millis(300));
        })
        .await;
    auth.mock_async(|when, then| {
        when.method(POST).path("/authorize");
        then.status(200).json_body(approval());
    })
    .await;

    let mut config = config(&fraud.base_url(), UNREACHABLE, &auth.base_url(), UNREACHABLE);
    config.policy.three_ds_enabled = false;
    let orchestrator = Orchestrator::from_config(&config, RecordingTransport::new());

    let result = orchestrator.process_transaction(&scenario_request(dec!(50))).await;

    assert!(result.approved);
    assert!(result.processing_time >= 300, "processing_time {}", result.processing_time);
}
