//! Charge lifecycle integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

// ============================================================================
// Evaluate and charge
// ============================================================================

#[tokio::test]
async fn first_charge_of_new_user_debits_one_credit() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 555, "feature": "lookup" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], true);
    assert_eq!(body["cost"], 1);
    assert_eq!(body["balance"], 4);
    assert!(body["charge_id"].is_string());
}

#[tokio::test]
async fn charge_without_api_key_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/charges")
        .json(&json!({ "user_id": 555, "feature": "lookup" }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn exhausted_balance_denies_with_message() {
    let harness = TestHarness::new();

    // A new user has 5 credits; spend them all.
    for _ in 0..5 {
        let response = harness
            .server
            .post("/v1/charges")
            .add_header("x-api-key", harness.api_key())
            .json(&json!({ "user_id": 7, "feature": "lookup" }))
            .await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["allowed"], true);
    }

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 7, "feature": "lookup" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "insufficient_credits");
    assert!(body["message"].is_string());
    assert!(body.get("charge_id").is_none());
}

#[tokio::test]
async fn capped_feature_denies_after_cap() {
    let harness = TestHarness::new();

    // Give the user enough balance to outlast the cap.
    harness
        .server
        .post("/v1/admin/credits/grant")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 9, "amount": 20 }))
        .await
        .assert_status_ok();

    for _ in 0..5 {
        let response = harness
            .server
            .post("/v1/charges")
            .add_header("x-api-key", harness.api_key())
            .json(&json!({ "user_id": 9, "feature": "views" }))
            .await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["allowed"], true);
    }

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 9, "feature": "views" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "daily_cap_reached");
}

// ============================================================================
// Commit and refund
// ============================================================================

#[tokio::test]
async fn commit_keeps_the_debit() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 555, "feature": "lookup" }))
        .await;
    let body: serde_json::Value = response.json();
    let charge_id = body["charge_id"].as_str().unwrap().to_string();

    let response = harness
        .server
        .post(&format!("/v1/charges/{charge_id}/commit"))
        .add_header("x-api-key", harness.api_key())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["state"], "committed");

    let response = harness
        .server
        .get("/v1/users/555/balance")
        .add_header("x-api-key", harness.api_key())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 4);
}

#[tokio::test]
async fn refund_returns_the_debit() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 555, "feature": "lookup" }))
        .await;
    let body: serde_json::Value = response.json();
    let charge_id = body["charge_id"].as_str().unwrap().to_string();
    assert_eq!(body["balance"], 4);

    let response = harness
        .server
        .post(&format!("/v1/charges/{charge_id}/refund"))
        .add_header("x-api-key", harness.api_key())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["state"], "refunded");

    let response = harness
        .server
        .get("/v1/users/555/balance")
        .add_header("x-api-key", harness.api_key())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 5);
}

#[tokio::test]
async fn double_settle_conflicts() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 555, "feature": "lookup" }))
        .await;
    let body: serde_json::Value = response.json();
    let charge_id = body["charge_id"].as_str().unwrap().to_string();

    harness
        .server
        .post(&format!("/v1/charges/{charge_id}/commit"))
        .add_header("x-api-key", harness.api_key())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post(&format!("/v1/charges/{charge_id}/refund"))
        .add_header("x-api-key", harness.api_key())
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_charge_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/charges/01ARZ3NDEKTSV4RRFFQ69G5FAV/commit")
        .add_header("x-api-key", harness.api_key())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn invalid_charge_id_is_bad_request() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/charges/not-a-ulid/commit")
        .add_header("x-api-key", harness.api_key())
        .await;

    response.assert_status_bad_request();
}
