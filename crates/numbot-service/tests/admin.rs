//! Admin surface integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn non_admin_actor_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/admin/credits/grant")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", "666")
        .json(&json!({ "user_id": 555, "amount": 10 }))
        .await;

    response.assert_status_forbidden();
}

#[tokio::test]
async fn missing_actor_header_is_bad_request() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/admin/credits/grant")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 555, "amount": 10 }))
        .await;

    response.assert_status_bad_request();
}

// ============================================================================
// Credits
// ============================================================================

#[tokio::test]
async fn grant_reports_previous_and_new_balance() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/admin/credits/grant")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 555, "amount": 20 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["previous_balance"], 5);
    assert_eq!(body["new_balance"], 25);
}

#[tokio::test]
async fn revoke_can_drive_balance_negative() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/admin/credits/revoke")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 555, "amount": 8 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["previous_balance"], 5);
    assert_eq!(body["new_balance"], -3);
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/admin/credits/grant")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 555, "amount": 0 }))
        .await;

    response.assert_status_bad_request();
}

// ============================================================================
// Blocks
// ============================================================================

#[tokio::test]
async fn block_denies_charges_until_unblock() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/admin/blocks")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 555, "reason": "abuse" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 555, "feature": "lookup" }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "blocked");

    // Redundant block reports rather than errors.
    let response = harness
        .server
        .post("/v1/admin/blocks")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 555, "reason": "again" }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "already_blocked");

    harness
        .server
        .delete("/v1/admin/blocks/555")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 555, "feature": "lookup" }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], true);
}

// ============================================================================
// Specials
// ============================================================================

#[tokio::test]
async fn promoted_user_charges_for_free() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/admin/specials")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 777, "display_name": "VIP User" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/users/777/balance")
        .add_header("x-api-key", harness.api_key())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 999);
    assert_eq!(body["role"], "special");

    let response = harness
        .server
        .post("/v1/charges")
        .add_header("x-api-key", harness.api_key())
        .json(&json!({ "user_id": 777, "feature": "lookup" }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], true);
    assert_eq!(body["cost"], 0);

    // Demotion resets to the normal starting balance.
    harness
        .server
        .delete("/v1/admin/specials/777")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/users/777/balance")
        .add_header("x-api-key", harness.api_key())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 5);
    assert_eq!(body["role"], "normal");
}

// ============================================================================
// Listings
// ============================================================================

#[tokio::test]
async fn users_and_audit_listings_reflect_mutations() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/admin/credits/grant")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 10, "amount": 5 }))
        .await
        .assert_status_ok();

    harness
        .server
        .post("/v1/admin/blocks")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .json(&json!({ "user_id": 11, "reason": "spam" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/admin/users")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let response = harness
        .server
        .get("/v1/admin/audit")
        .add_header("x-api-key", harness.api_key())
        .add_header("x-actor-id", TestHarness::admin_actor())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let audit = body["audit"].as_array().unwrap();
    assert_eq!(audit.len(), 2);
    // Newest first.
    assert_eq!(audit[0]["target"], 11);
    assert_eq!(audit[1]["target"], 10);
}
