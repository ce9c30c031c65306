//! Charge lifecycle handlers: evaluate-and-charge, commit, refund.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use numbot_core::{ChargeId, ChargeRecord, UserId};
use numbot_engine::ChargeDecision;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Begin-charge request from a feature handler.
#[derive(Debug, Deserialize)]
pub struct BeginChargeRequest {
    /// The caller being charged.
    pub user_id: i64,
    /// Feature tag, e.g. `"lookup"` or `"views"`.
    pub feature: String,
}

/// Begin-charge response.
///
/// Denials are part of the normal response, not HTTP errors: the chat
/// transport renders `message` straight into the conversation.
#[derive(Debug, Serialize)]
pub struct BeginChargeResponse {
    /// Whether the operation may proceed.
    pub allowed: bool,
    /// Credits debited (0 for admin/special callers).
    pub cost: i64,
    /// The charge to settle after the lookup, if the caller paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_id: Option<String>,
    /// Balance after the debit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    /// Stable deny code, when refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Message to show the caller, when refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Evaluate a request and debit the caller if it is a paid operation.
pub async fn begin_charge(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<BeginChargeRequest>,
) -> Result<Json<BeginChargeResponse>, ApiError> {
    tracing::debug!(
        service = %auth.service_name,
        user_id = %body.user_id,
        feature = %body.feature,
        "Processing charge request"
    );

    let decision = state
        .engine
        .begin_charge(UserId::new(body.user_id), &body.feature)?;

    let response = match decision {
        ChargeDecision::Approved {
            charge,
            cost,
            balance,
        } => BeginChargeResponse {
            allowed: true,
            cost,
            charge_id: charge.map(|c| c.id.to_string()),
            balance: Some(balance),
            reason: None,
            message: None,
        },
        ChargeDecision::Denied { reason } => {
            tracing::debug!(
                user_id = %body.user_id,
                feature = %body.feature,
                reason = reason.code(),
                "Charge denied"
            );
            BeginChargeResponse {
                allowed: false,
                cost: 0,
                charge_id: None,
                balance: None,
                reason: Some(reason.code()),
                message: Some(reason.user_message()),
            }
        }
    };

    Ok(Json(response))
}

/// Settled-charge response.
#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    /// The charge id.
    pub charge_id: String,
    /// The caller the charge belongs to.
    pub user_id: i64,
    /// Credits involved.
    pub credits: i64,
    /// Settlement state after this call.
    pub state: String,
}

impl From<ChargeRecord> for ChargeResponse {
    fn from(charge: ChargeRecord) -> Self {
        Self {
            charge_id: charge.id.to_string(),
            user_id: charge.user_id.as_i64(),
            credits: charge.credits,
            state: format!("{:?}", charge.state).to_lowercase(),
        }
    }
}

/// Commit a pending charge: the lookup produced a usable result.
pub async fn commit_charge(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(charge_id): Path<String>,
) -> Result<Json<ChargeResponse>, ApiError> {
    let charge_id = parse_charge_id(&charge_id)?;
    let charge = state.engine.commit_charge(charge_id)?;
    Ok(Json(charge.into()))
}

/// Refund a pending charge: the lookup produced nothing.
pub async fn refund_charge(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(charge_id): Path<String>,
) -> Result<Json<ChargeResponse>, ApiError> {
    let charge_id = parse_charge_id(&charge_id)?;
    let charge = state.engine.refund_charge(charge_id)?;
    Ok(Json(charge.into()))
}

fn parse_charge_id(raw: &str) -> Result<ChargeId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid charge id".into()))
}
