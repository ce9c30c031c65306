//! Webhook-backed notifier.
//!
//! Delivers grant notifications to the chat transport's internal webhook;
//! the transport renders and sends the actual chat message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use numbot_core::UserId;
use numbot_engine::{Notifier, NotifyError};

/// Notifier that POSTs `{user_id, message}` to a configured webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct NotifyPayload<'a> {
    user_id: i64,
    message: &'a str,
}

impl WebhookNotifier {
    /// Create a new webhook notifier.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, user_id: UserId, message: &str) -> Result<(), NotifyError> {
        let payload = NotifyPayload {
            user_id: user_id.as_i64(),
            message,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
