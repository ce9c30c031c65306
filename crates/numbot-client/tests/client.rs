//! Client SDK tests against a mocked credit service.

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use numbot_client::{ClientError, NumbotClient};
use serde_json::json;

async fn mock_client() -> (MockServer, NumbotClient) {
    let server = MockServer::start().await;
    let client = NumbotClient::new(server.uri(), "test-key");
    (server, client)
}

#[tokio::test]
async fn begin_charge_sends_api_key_and_parses_approval() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/v1/charges"))
        .and(header("x-api-key", "test-key"))
        .and(body_json(json!({ "user_id": 555, "feature": "lookup" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": true,
            "cost": 1,
            "charge_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "balance": 4
        })))
        .mount(&server)
        .await;

    let response = client.begin_charge(555, "lookup").await.unwrap();
    assert!(response.allowed);
    assert_eq!(response.cost, 1);
    assert_eq!(response.balance, Some(4));
    assert_eq!(
        response.charge_id.as_deref(),
        Some("01ARZ3NDEKTSV4RRFFQ69G5FAV")
    );
}

#[tokio::test]
async fn denied_charge_carries_reason_and_message() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/v1/charges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": false,
            "cost": 0,
            "reason": "blocked",
            "message": "Your account has been blocked. Contact the administrator."
        })))
        .mount(&server)
        .await;

    let response = client.begin_charge(555, "lookup").await.unwrap();
    assert!(!response.allowed);
    assert_eq!(response.reason.as_deref(), Some("blocked"));
    assert!(response.message.is_some());
    assert!(response.charge_id.is_none());
}

#[tokio::test]
async fn refund_failed_maps_to_typed_error() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/v1/charges/01ARZ3NDEKTSV4RRFFQ69G5FAV/refund"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {
                "code": "refund_failed",
                "message": "A refund could not be applied; the account needs manual reconciliation",
                "details": { "user_id": 555, "credits": 1 }
            }
        })))
        .mount(&server)
        .await;

    let result = client.refund_charge("01ARZ3NDEKTSV4RRFFQ69G5FAV").await;
    match result {
        Err(ClientError::RefundFailed { user_id, credits }) => {
            assert_eq!(user_id, 555);
            assert_eq!(credits, 1);
        }
        other => panic!("expected RefundFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn forbidden_admin_call_maps_to_typed_error() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/v1/admin/credits/grant"))
        .and(header("x-actor-id", "666"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": "forbidden",
                "message": "User 666 is not the administrator"
            }
        })))
        .mount(&server)
        .await;

    let result = client.admin_grant(666, 555, 10).await;
    assert!(matches!(result, Err(ClientError::Forbidden { .. })));
}

#[tokio::test]
async fn claim_daily_grant_parses_already_claimed() {
    let (server, client) = mock_client().await;

    Mock::given(method("POST"))
        .and(path("/v1/users/555/claim-daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "granted": false,
            "status": "already_claimed",
            "balance": 15,
            "already_claimed_on": "2026-08-06"
        })))
        .mount(&server)
        .await;

    let response = client.claim_daily_grant(555).await.unwrap();
    assert!(!response.granted);
    assert_eq!(response.status, "already_claimed");
    assert_eq!(response.already_claimed_on.as_deref(), Some("2026-08-06"));
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_api_error() {
    let (server, client) = mock_client().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/555/balance"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let result = client.get_balance(555).await;
    match result {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 502),
        other => panic!("expected Api error, got {other:?}"),
    }
}
