//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `ServiceAuth` - service-to-service authentication via API key
//! - `Actor` - the acting user behind a request, for admin checks and audit

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use numbot_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Service authentication via API key.
///
/// The chat transport and feature handlers are the only clients; each
/// request carries the shared key in `X-Api-Key`.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// The service name or identifier, for log lines.
    pub service_name: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected_key = state
            .config
            .service_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if api_key != expected_key {
            return Err(ApiError::Unauthorized);
        }

        let service_name = parts
            .headers
            .get("x-service-name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(ServiceAuth { service_name })
    }
}

/// The acting user behind a request, from the `X-Actor-Id` header.
///
/// The chat transport forwards the id of whoever issued the command. Admin
/// authorization is NOT decided here: the engine re-checks the actor
/// against the configured admin id on every privileged call.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing X-Actor-Id header".into()))?
            .parse::<UserId>()
            .map_err(|_| ApiError::BadRequest("Invalid X-Actor-Id header".into()))?;

        Ok(Actor(actor))
    }
}
