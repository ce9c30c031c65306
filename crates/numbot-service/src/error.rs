//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use numbot_engine::EngineError;
use numbot_store::StoreError;

/// API error type.
///
/// Quota denials are not errors — they come back in the 200 response body
/// for the charge endpoints, because the chat transport renders them as
/// normal replies. This enum covers the conditions that are genuinely wrong.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid service API key.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - the acting user is not the administrator.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - e.g. a charge that was already settled.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A due refund could not be applied. Accounting-critical.
    #[error("refund failed for user {user_id}")]
    RefundFailed {
        /// The user left out of pocket.
        user_id: i64,
        /// The credits that were not returned.
        credits: i64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::RefundFailed { user_id, credits } => {
                tracing::error!(
                    user_id,
                    credits,
                    "refund failed; surfacing to operator channel"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "refund_failed",
                    "A refund could not be applied; the account needs manual reconciliation"
                        .to_string(),
                    Some(serde_json::json!({
                        "user_id": user_id,
                        "credits": credits
                    })),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                // Generic message only: storage details never leak to users.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Something went wrong. Please try again later.".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Storage(StoreError::ChargeAlreadySettled { charge_id }) => {
                Self::Conflict(format!("Charge {charge_id} already settled"))
            }
            EngineError::Storage(StoreError::NotFound) => Self::NotFound("Account not found".into()),
            EngineError::Storage(e) => Self::Internal(e.to_string()),
            EngineError::RefundFailed {
                user_id, credits, ..
            } => Self::RefundFailed {
                user_id: user_id.as_i64(),
                credits,
            },
            EngineError::NotAdmin { actor } => {
                Self::Forbidden(format!("User {actor} is not the administrator"))
            }
            EngineError::InvalidAmount(amount) => {
                Self::BadRequest(format!("Amount must be positive, got {amount}"))
            }
            EngineError::ChargeNotFound(charge_id) => {
                Self::NotFound(format!("Charge not found: {charge_id}"))
            }
        }
    }
}
