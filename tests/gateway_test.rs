mod common;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::test_config;
use ticketing_api::{
    errors::ServiceError,
    services::gateway::{PaymentGateway, PaystackGateway},
};

fn gateway_for(server: &MockServer) -> PaystackGateway {
    let mut cfg = test_config(None);
    cfg.paystack_secret_key = Some("sk_test_abc123".to_string());
    cfg.paystack_base_url = server.uri();
    PaystackGateway::new(&cfg).unwrap()
}

#[tokio::test]
async fn initialize_posts_the_transaction_and_returns_the_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .and(header("authorization", "Bearer sk_test_abc123"))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "amount": 1_000_000,
            "reference": "PSK-ABCDEF123456"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": { "authorization_url": "https://checkout.paystack.com/xyz" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let auth = gateway
        .initialize("ada@example.com", 1_000_000, "PSK-ABCDEF123456")
        .await
        .unwrap();
    assert_eq!(auth.authorization_url, "https://checkout.paystack.com/xyz");
}

#[tokio::test]
async fn initialize_rejection_is_an_external_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": false,
            "message": "Invalid key"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .initialize("ada@example.com", 1_000_000, "PSK-ABCDEF123456")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ExternalServiceError(_));
}

#[tokio::test]
async fn initialize_http_failure_is_an_external_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .initialize("ada@example.com", 1_000_000, "PSK-ABCDEF123456")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ExternalServiceError(_));
}

#[tokio::test]
async fn verify_succeeds_only_for_successful_transactions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/PSK-ABCDEF123456"))
        .and(header("authorization", "Bearer sk_test_abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": { "status": "success" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.verify("PSK-ABCDEF123456").await.unwrap();
}

#[tokio::test]
async fn verify_treats_non_success_transactions_as_payment_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/PSK-ABCDEF123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": { "status": "abandoned" }
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.verify("PSK-ABCDEF123456").await.unwrap_err();
    assert_matches!(err, ServiceError::PaymentFailed(_));
}

#[tokio::test]
async fn verify_of_unknown_reference_is_a_payment_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/PSK-NOSUCHREF000"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": false,
            "message": "Transaction reference not found"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.verify("PSK-NOSUCHREF000").await.unwrap_err();
    assert_matches!(err, ServiceError::PaymentFailed(_));
}

#[tokio::test]
async fn missing_secret_key_fails_without_touching_the_network() {
    let cfg = test_config(None);
    let gateway = PaystackGateway::new(&cfg).unwrap();

    let err = gateway
        .initialize("ada@example.com", 1_000_000, "PSK-ABCDEF123456")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ExternalServiceError(_));

    let err = gateway.verify("PSK-ABCDEF123456").await.unwrap_err();
    assert_matches!(err, ServiceError::ExternalServiceError(_));
}
