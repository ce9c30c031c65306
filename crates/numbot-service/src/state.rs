//! Application state.

use std::sync::Arc;

use numbot_engine::CreditEngine;
use numbot_store::RocksStore;

use crate::config::ServiceConfig;
use crate::notify::WebhookNotifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The credit engine over the RocksDB ledger.
    pub engine: Arc<CreditEngine<RocksStore>>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let mut engine = CreditEngine::new(store, config.engine_config());

        // Wire the notification webhook if configured
        if let Some(url) = config.notify_webhook_url.as_ref() {
            tracing::info!(webhook_url = %url, "Notification webhook enabled");
            engine = engine.with_notifier(Arc::new(WebhookNotifier::new(url)));
        } else {
            tracing::warn!("Notification webhook not configured - grant notifications will be dropped");
        }

        Self {
            engine: Arc::new(engine),
            config,
        }
    }
}
