//! Admin surface handlers.
//!
//! Authorization lives in the engine: every handler passes the acting user
//! through and lets the admin check run fresh on each call.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use numbot_core::{Account, AuditRecord, HistoryRecord, SpecialUser, UserId};
use numbot_engine::{BlockOutcome, DemoteOutcome, PromoteOutcome, UnblockOutcome};

use crate::auth::{Actor, ServiceAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Credit mutation request.
#[derive(Debug, Deserialize)]
pub struct CreditMutationRequest {
    /// The target user.
    pub user_id: i64,
    /// Credits to grant or revoke. Must be positive.
    pub amount: i64,
}

/// Credit mutation response.
#[derive(Debug, Serialize)]
pub struct CreditMutationResponse {
    /// The target user.
    pub user_id: i64,
    /// Balance before the mutation.
    pub previous_balance: i64,
    /// Balance after the mutation.
    pub new_balance: i64,
}

/// Grant credits to a user.
pub async fn grant_credits(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Json(body): Json<CreditMutationRequest>,
) -> Result<Json<CreditMutationResponse>, ApiError> {
    let target = UserId::new(body.user_id);
    let change = state.engine.grant_credits(actor, target, body.amount)?;

    Ok(Json(CreditMutationResponse {
        user_id: body.user_id,
        previous_balance: change.previous,
        new_balance: change.new,
    }))
}

/// Revoke credits from a user. The balance may go negative.
pub async fn revoke_credits(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Json(body): Json<CreditMutationRequest>,
) -> Result<Json<CreditMutationResponse>, ApiError> {
    let target = UserId::new(body.user_id);
    let change = state.engine.revoke_credits(actor, target, body.amount)?;

    Ok(Json(CreditMutationResponse {
        user_id: body.user_id,
        previous_balance: change.previous,
        new_balance: change.new,
    }))
}

/// Block request.
#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    /// The target user.
    pub user_id: i64,
    /// Reason for the block, for the audit trail.
    pub reason: String,
}

/// Status-only response for idempotent admin actions.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// The target user.
    pub user_id: i64,
    /// What happened: `applied` or the redundancy code.
    pub status: &'static str,
}

/// Block a user.
pub async fn block_user(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Json(body): Json<BlockRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let outcome = state
        .engine
        .block(actor, UserId::new(body.user_id), body.reason)?;

    let status = match outcome {
        BlockOutcome::Blocked(_) => "applied",
        BlockOutcome::AlreadyBlocked => "already_blocked",
    };

    Ok(Json(StatusResponse {
        user_id: body.user_id,
        status,
    }))
}

/// Unblock a user.
pub async fn unblock_user(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Path(user_id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    let outcome = state.engine.unblock(actor, UserId::new(user_id))?;

    let status = match outcome {
        UnblockOutcome::Unblocked(_) => "applied",
        UnblockOutcome::NotBlocked => "not_blocked",
    };

    Ok(Json(StatusResponse { user_id, status }))
}

/// Promotion request.
#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    /// The target user.
    pub user_id: i64,
    /// Display name for admin listings.
    pub display_name: String,
}

/// Promote a user onto the special allow-list.
pub async fn promote_special(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Json(body): Json<PromoteRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let outcome =
        state
            .engine
            .promote_special(actor, UserId::new(body.user_id), body.display_name)?;

    let status = match outcome {
        PromoteOutcome::Promoted(_) => "applied",
        PromoteOutcome::AlreadySpecial => "already_special",
    };

    Ok(Json(StatusResponse {
        user_id: body.user_id,
        status,
    }))
}

/// Demote a user from the special allow-list.
pub async fn demote_special(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Path(user_id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    let outcome = state.engine.demote_special(actor, UserId::new(user_id))?;

    let status = match outcome {
        DemoteOutcome::Demoted(_) => "applied",
        DemoteOutcome::NotSpecial => "not_special",
    };

    Ok(Json(StatusResponse { user_id, status }))
}

/// Account summary in admin listings.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    /// The user id.
    pub user_id: i64,
    /// Current balance.
    pub balance: i64,
    /// Whether the account is blocked.
    pub blocked: bool,
    /// Last daily-grant date, if any.
    pub last_grant_date: Option<String>,
}

impl From<&Account> for UserSummary {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.user_id.as_i64(),
            balance: account.credits,
            blocked: account.is_blocked,
            last_grant_date: account.last_grant_date.map(|d| d.to_string()),
        }
    }
}

/// User listing response.
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// All known accounts.
    pub users: Vec<UserSummary>,
}

/// List every account.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let accounts = state.engine.list_users(actor)?;
    let users = accounts.iter().map(UserSummary::from).collect();

    Ok(Json(ListUsersResponse { users }))
}

/// Special-user summary.
#[derive(Debug, Serialize)]
pub struct SpecialSummary {
    /// The user id.
    pub user_id: i64,
    /// Display name recorded at promotion.
    pub display_name: String,
    /// When the promotion happened.
    pub promoted_at: String,
}

impl From<&SpecialUser> for SpecialSummary {
    fn from(special: &SpecialUser) -> Self {
        Self {
            user_id: special.user_id.as_i64(),
            display_name: special.display_name.clone(),
            promoted_at: special.promoted_at.to_rfc3339(),
        }
    }
}

/// Allow-list response.
#[derive(Debug, Serialize)]
pub struct ListSpecialsResponse {
    /// Current allow-list members.
    pub specials: Vec<SpecialSummary>,
}

/// List the special allow-list.
pub async fn list_specials(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
) -> Result<Json<ListSpecialsResponse>, ApiError> {
    let records = state.engine.list_special_users(actor)?;
    let specials = records.iter().map(SpecialSummary::from).collect();

    Ok(Json(ListSpecialsResponse { specials }))
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Maximum rows to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// History entry in admin listings.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    /// Record id.
    pub id: String,
    /// The query text.
    pub query: String,
    /// Feature tag.
    pub feature: String,
    /// When the query ran.
    pub recorded_at: String,
}

impl From<&HistoryRecord> for HistoryEntry {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            query: record.query.clone(),
            feature: record.feature.clone(),
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

/// History listing response.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// The user the history belongs to.
    pub user_id: i64,
    /// History rows, newest first.
    pub history: Vec<HistoryEntry>,
}

/// Read a user's query history.
pub async fn user_history(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.min(100);
    let rows = state
        .engine
        .user_history(actor, UserId::new(user_id), limit, query.offset)?;

    Ok(Json(HistoryResponse {
        user_id,
        history: rows.iter().map(HistoryEntry::from).collect(),
    }))
}

/// Audit entry in listings.
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    /// Record id.
    pub id: String,
    /// The admin who acted.
    pub actor: i64,
    /// The targeted account.
    pub target: i64,
    /// The action, as structured JSON.
    pub action: serde_json::Value,
    /// Outcome summary.
    pub outcome: String,
    /// When it happened.
    pub created_at: String,
}

impl From<&AuditRecord> for AuditEntry {
    fn from(record: &AuditRecord) -> Self {
        Self {
            id: record.id.to_string(),
            actor: record.actor.as_i64(),
            target: record.target.as_i64(),
            action: serde_json::to_value(&record.action).unwrap_or(serde_json::Value::Null),
            outcome: record.outcome.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Audit listing response.
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    /// Audit rows, newest first.
    pub audit: Vec<AuditEntry>,
}

/// Read the admin audit log.
pub async fn audit_log(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Actor(actor): Actor,
    Query(query): Query<PageQuery>,
) -> Result<Json<AuditResponse>, ApiError> {
    let limit = query.limit.min(100);
    let rows = state.engine.audit_log(actor, limit, query.offset)?;

    Ok(Json(AuditResponse {
        audit: rows.iter().map(AuditEntry::from).collect(),
    }))
}
