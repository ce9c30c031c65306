//! Balance and daily-grant handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use numbot_core::{ClaimOutcome, UserId};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// The caller.
    pub user_id: i64,
    /// Current credit balance.
    pub balance: i64,
    /// The caller's role, resolved fresh.
    pub role: String,
}

/// Get a caller's current balance, creating the account if absent.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user_id = UserId::new(user_id);
    let balance = state.engine.get_balance(user_id)?;
    let role = state.engine.role_of(user_id)?;

    Ok(Json(BalanceResponse {
        user_id: user_id.as_i64(),
        balance,
        role: format!("{role:?}").to_lowercase(),
    }))
}

/// Daily-grant claim response.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    /// Whether credits were granted by this call.
    pub granted: bool,
    /// Outcome code: `granted`, `already_claimed`, `not_eligible`, `blocked`.
    pub status: &'static str,
    /// Balance after the call, where known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    /// When the grant was last claimed, for `already_claimed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_claimed_on: Option<String>,
}

/// Handle an explicit "claim daily credits" request.
pub async fn claim_daily_grant(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let outcome = state.engine.claim_daily_grant(UserId::new(user_id))?;

    let response = match outcome {
        ClaimOutcome::Granted { new_balance } => ClaimResponse {
            granted: true,
            status: "granted",
            balance: Some(new_balance),
            already_claimed_on: None,
        },
        ClaimOutcome::AlreadyClaimed {
            claimed_on,
            balance,
        } => ClaimResponse {
            granted: false,
            status: "already_claimed",
            balance: Some(balance),
            already_claimed_on: Some(claimed_on.to_string()),
        },
        ClaimOutcome::NotEligible { .. } => ClaimResponse {
            granted: false,
            status: "not_eligible",
            balance: None,
            already_claimed_on: None,
        },
        ClaimOutcome::Blocked => ClaimResponse {
            granted: false,
            status: "blocked",
            balance: None,
            already_claimed_on: None,
        },
    };

    Ok(Json(response))
}

/// Block-status response.
#[derive(Debug, Serialize)]
pub struct BlockedResponse {
    /// The caller.
    pub user_id: i64,
    /// Whether the caller has an active block.
    pub blocked: bool,
}

/// Check whether a caller is blocked.
pub async fn is_blocked(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<BlockedResponse>, ApiError> {
    let blocked = state.engine.is_blocked(UserId::new(user_id))?;

    Ok(Json(BlockedResponse { user_id, blocked }))
}
