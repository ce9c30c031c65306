//! Query-history ingestion.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use numbot_core::UserId;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// History ingestion request, sent by feature handlers after a successful
/// lookup.
#[derive(Debug, Deserialize)]
pub struct RecordHistoryRequest {
    /// The caller who made the query.
    pub user_id: i64,
    /// The query text as sent.
    pub query: String,
    /// Feature tag the query was routed to.
    pub feature: String,
}

/// History ingestion response.
#[derive(Debug, Serialize)]
pub struct RecordHistoryResponse {
    /// The new record's id.
    pub id: String,
    /// When it was recorded.
    pub recorded_at: String,
}

/// Append a query to the caller's history.
pub async fn record_history(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<RecordHistoryRequest>,
) -> Result<Json<RecordHistoryResponse>, ApiError> {
    let record =
        state
            .engine
            .record_history(UserId::new(body.user_id), body.query, body.feature)?;

    tracing::debug!(
        service = %auth.service_name,
        user_id = %record.user_id,
        feature = %record.feature,
        "History recorded"
    );

    Ok(Json(RecordHistoryResponse {
        id: record.id.to_string(),
        recorded_at: record.recorded_at.to_rfc3339(),
    }))
}
