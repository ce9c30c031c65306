//! Request and response types for the numbot credit service API.

use serde::{Deserialize, Serialize};

/// Begin-charge request body.
#[derive(Debug, Clone, Serialize)]
pub struct BeginChargeRequest {
    /// The caller being charged.
    pub user_id: i64,
    /// Feature tag, e.g. `"lookup"`.
    pub feature: String,
}

/// Begin-charge response.
#[derive(Debug, Clone, Deserialize)]
pub struct BeginChargeResponse {
    /// Whether the operation may proceed.
    pub allowed: bool,
    /// Credits debited (0 for admin/special callers).
    pub cost: i64,
    /// The charge to settle after the lookup, if the caller paid.
    #[serde(default)]
    pub charge_id: Option<String>,
    /// Balance after the debit.
    #[serde(default)]
    pub balance: Option<i64>,
    /// Stable deny code, when refused.
    #[serde(default)]
    pub reason: Option<String>,
    /// Ready-to-send message for the caller, when refused.
    #[serde(default)]
    pub message: Option<String>,
}

/// Settled-charge response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeResponse {
    /// The charge id.
    pub charge_id: String,
    /// The caller the charge belongs to.
    pub user_id: i64,
    /// Credits involved.
    pub credits: i64,
    /// Settlement state after the call.
    pub state: String,
}

/// Balance response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// The caller.
    pub user_id: i64,
    /// Current credit balance.
    pub balance: i64,
    /// The caller's role: `admin`, `special`, or `normal`.
    pub role: String,
}

/// Daily-grant claim response.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResponse {
    /// Whether credits were granted by this call.
    pub granted: bool,
    /// Outcome code: `granted`, `already_claimed`, `not_eligible`, `blocked`.
    pub status: String,
    /// Balance after the call, where known.
    #[serde(default)]
    pub balance: Option<i64>,
    /// When the grant was last claimed, for `already_claimed`.
    #[serde(default)]
    pub already_claimed_on: Option<String>,
}

/// Block-status response.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockedResponse {
    /// The caller.
    pub user_id: i64,
    /// Whether the caller has an active block.
    pub blocked: bool,
}

/// History ingestion request body.
#[derive(Debug, Clone, Serialize)]
pub struct RecordHistoryRequest {
    /// The caller who made the query.
    pub user_id: i64,
    /// The query text as sent.
    pub query: String,
    /// Feature tag the query was routed to.
    pub feature: String,
}

/// History ingestion response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordHistoryResponse {
    /// The new record's id.
    pub id: String,
    /// When it was recorded.
    pub recorded_at: String,
}

/// Admin credit mutation request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreditMutationRequest {
    /// The target user.
    pub user_id: i64,
    /// Credits to grant or revoke. Must be positive.
    pub amount: i64,
}

/// Admin credit mutation response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditMutationResponse {
    /// The target user.
    pub user_id: i64,
    /// Balance before the mutation.
    pub previous_balance: i64,
    /// Balance after the mutation.
    pub new_balance: i64,
}

/// Admin block request body.
#[derive(Debug, Clone, Serialize)]
pub struct BlockRequest {
    /// The target user.
    pub user_id: i64,
    /// Reason for the block.
    pub reason: String,
}

/// Admin promotion request body.
#[derive(Debug, Clone, Serialize)]
pub struct PromoteRequest {
    /// The target user.
    pub user_id: i64,
    /// Display name for admin listings.
    pub display_name: String,
}

/// Status-only response for idempotent admin actions.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// The target user.
    pub user_id: i64,
    /// What happened: `applied` or the redundancy code.
    pub status: String,
}

/// Error envelope returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// The error body.
    pub error: ApiErrorBody,
}

/// Error body inside the envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Stable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured details, when present.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
