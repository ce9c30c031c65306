//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, charges, credits, history};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for the charge endpoints.
/// Every inbound chat message lands here, so the limit is the highest.
const CHARGE_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Charges (service API key auth)
/// - `POST /v1/charges` - Evaluate and charge
/// - `POST /v1/charges/{id}/commit` - Finalize a charge
/// - `POST /v1/charges/{id}/refund` - Return a charge
///
/// ## Users (service API key auth)
/// - `GET  /v1/users/{id}/balance` - Current balance and role
/// - `POST /v1/users/{id}/claim-daily` - Claim the daily grant
/// - `GET  /v1/users/{id}/blocked` - Block status
///
/// ## History (service API key auth)
/// - `POST /v1/history` - Record a completed lookup
///
/// ## Admin (service API key auth + acting user id, verified by the engine)
/// - `POST   /v1/admin/credits/grant`
/// - `POST   /v1/admin/credits/revoke`
/// - `POST   /v1/admin/blocks`
/// - `DELETE /v1/admin/blocks/{id}`
/// - `POST   /v1/admin/specials`
/// - `DELETE /v1/admin/specials/{id}`
/// - `GET    /v1/admin/users`
/// - `GET    /v1/admin/specials`
/// - `GET    /v1/admin/users/{id}/history`
/// - `GET    /v1/admin/audit`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Charge routes carry the whole chat traffic; give them their own limit.
    let charge_routes = Router::new()
        .route("/", post(charges::begin_charge))
        .route("/:id/commit", post(charges::commit_charge))
        .route("/:id/refund", post(charges::refund_charge))
        .layer(ConcurrencyLimitLayer::new(CHARGE_MAX_CONCURRENT_REQUESTS));

    let admin_routes = Router::new()
        .route("/credits/grant", post(admin::grant_credits))
        .route("/credits/revoke", post(admin::revoke_credits))
        .route("/blocks", post(admin::block_user))
        .route("/blocks/:id", delete(admin::unblock_user))
        .route("/specials", post(admin::promote_special))
        .route("/specials", get(admin::list_specials))
        .route("/specials/:id", delete(admin::demote_special))
        .route("/users", get(admin::list_users))
        .route("/users/:id/history", get(admin::user_history))
        .route("/audit", get(admin::audit_log));

    let api_routes = Router::new()
        // Users
        .route("/users/:id/balance", get(credits::get_balance))
        .route("/users/:id/claim-daily", post(credits::claim_daily_grant))
        .route("/users/:id/blocked", get(credits::is_blocked))
        // History ingestion
        .route("/history", post(history::record_history))
        // Admin surface
        .nest("/admin", admin_routes)
        // Charge routes (with their own concurrency limit)
        .nest("/charges", charge_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // API v1 routes
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
