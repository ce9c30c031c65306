//! Numbot credit service HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, BalanceResponse, BeginChargeRequest, BeginChargeResponse, BlockRequest,
    BlockedResponse, ChargeResponse, ClaimResponse, CreditMutationRequest, CreditMutationResponse,
    PromoteRequest, RecordHistoryRequest, RecordHistoryResponse, StatusResponse,
};

/// Numbot credit service API client.
///
/// Provides methods for charging lookups, checking balances, and the admin
/// surface.
#[derive(Debug, Clone)]
pub struct NumbotClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

impl NumbotClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the credit service (e.g., `"http://numbot-credits:8080"`)
    /// * `api_key` - Service API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_name: options.service_name,
        }
    }

    /// Evaluate a request and charge the caller if it is a paid operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn begin_charge(
        &self,
        user_id: i64,
        feature: impl Into<String>,
    ) -> Result<BeginChargeResponse, ClientError> {
        let url = format!("{}/v1/charges", self.base_url);
        let request = BeginChargeRequest {
            user_id,
            feature: feature.into(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Commit a pending charge after a successful lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn commit_charge(&self, charge_id: &str) -> Result<ChargeResponse, ClientError> {
        self.settle_charge(charge_id, "commit").await
    }

    /// Refund a pending charge after an empty or failed lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error;
    /// `ClientError::RefundFailed` specifically when the service could not
    /// return the credits.
    pub async fn refund_charge(&self, charge_id: &str) -> Result<ChargeResponse, ClientError> {
        self.settle_charge(charge_id, "refund").await
    }

    async fn settle_charge(
        &self,
        charge_id: &str,
        action: &str,
    ) -> Result<ChargeResponse, ClientError> {
        let url = format!("{}/v1/charges/{charge_id}/{action}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a caller's balance and role.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_balance(&self, user_id: i64) -> Result<BalanceResponse, ClientError> {
        let url = format!("{}/v1/users/{user_id}/balance", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Claim the caller's daily credit grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn claim_daily_grant(&self, user_id: i64) -> Result<ClaimResponse, ClientError> {
        let url = format!("{}/v1/users/{user_id}/claim-daily", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Check whether a caller is blocked.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn is_blocked(&self, user_id: i64) -> Result<BlockedResponse, ClientError> {
        let url = format!("{}/v1/users/{user_id}/blocked", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Record a completed lookup in the caller's history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn record_history(
        &self,
        user_id: i64,
        query: impl Into<String>,
        feature: impl Into<String>,
    ) -> Result<RecordHistoryResponse, ClientError> {
        let url = format!("{}/v1/history", self.base_url);
        let request = RecordHistoryRequest {
            user_id,
            query: query.into(),
            feature: feature.into(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Grant credits to a user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn admin_grant(
        &self,
        actor_id: i64,
        user_id: i64,
        amount: i64,
    ) -> Result<CreditMutationResponse, ClientError> {
        let url = format!("{}/v1/admin/credits/grant", self.base_url);
        self.admin_post(&url, actor_id, &CreditMutationRequest { user_id, amount })
            .await
    }

    /// Revoke credits from a user (admin). The balance may go negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn admin_revoke(
        &self,
        actor_id: i64,
        user_id: i64,
        amount: i64,
    ) -> Result<CreditMutationResponse, ClientError> {
        let url = format!("{}/v1/admin/credits/revoke", self.base_url);
        self.admin_post(&url, actor_id, &CreditMutationRequest { user_id, amount })
            .await
    }

    /// Block a user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn admin_block(
        &self,
        actor_id: i64,
        user_id: i64,
        reason: impl Into<String>,
    ) -> Result<StatusResponse, ClientError> {
        let url = format!("{}/v1/admin/blocks", self.base_url);
        self.admin_post(
            &url,
            actor_id,
            &BlockRequest {
                user_id,
                reason: reason.into(),
            },
        )
        .await
    }

    /// Unblock a user (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn admin_unblock(
        &self,
        actor_id: i64,
        user_id: i64,
    ) -> Result<StatusResponse, ClientError> {
        let url = format!("{}/v1/admin/blocks/{user_id}", self.base_url);
        self.admin_delete(&url, actor_id).await
    }

    /// Promote a user onto the special allow-list (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn admin_promote_special(
        &self,
        actor_id: i64,
        user_id: i64,
        display_name: impl Into<String>,
    ) -> Result<StatusResponse, ClientError> {
        let url = format!("{}/v1/admin/specials", self.base_url);
        self.admin_post(
            &url,
            actor_id,
            &PromoteRequest {
                user_id,
                display_name: display_name.into(),
            },
        )
        .await
    }

    /// Demote a user from the special allow-list (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn admin_demote_special(
        &self,
        actor_id: i64,
        user_id: i64,
    ) -> Result<StatusResponse, ClientError> {
        let url = format!("{}/v1/admin/specials/{user_id}", self.base_url);
        self.admin_delete(&url, actor_id).await
    }

    async fn admin_post<B, T>(&self, url: &str, actor_id: i64, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .header("x-actor-id", actor_id.to_string())
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn admin_delete<T>(&self, url: &str, actor_id: i64) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .delete(url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .header("x-actor-id", actor_id.to_string())
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        tracing::debug!(status = %status, "credit service returned an error response");

        // Try to parse the error envelope
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;

                match code {
                    "refund_failed" => {
                        let user_id = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("user_id"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);
                        let credits = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("credits"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);

                        Err(ClientError::RefundFailed { user_id, credits })
                    }
                    "forbidden" => Err(ClientError::Forbidden { message }),
                    "not_found" => Err(ClientError::NotFound { message }),
                    "conflict" => Err(ClientError::Conflict { message }),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Service name to include in requests.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}
