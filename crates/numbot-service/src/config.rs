//! Service configuration.

use numbot_core::UserId;
use numbot_engine::{EngineConfig, VIEWS_FEATURE};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/numbot").
    pub data_dir: String,

    /// The singleton administrator's chat-platform user id.
    pub admin_user_id: i64,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// Webhook URL the chat transport listens on for user notifications
    /// (optional; notifications are dropped when unset).
    pub notify_webhook_url: Option<String>,

    /// IANA time zone whose calendar days drive grants and caps.
    pub time_zone: String,

    /// Daily cap for the rate-limited record-view feature.
    pub views_daily_cap: u32,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/numbot".into()),
            admin_user_id: std::env::var("ADMIN_USER_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            time_zone: std::env::var("TIME_ZONE").unwrap_or_else(|_| "Asia/Kolkata".into()),
            views_daily_cap: std::env::var("VIEWS_DAILY_CAP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(numbot_core::DEFAULT_DAILY_FEATURE_CAP),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Build the engine configuration this service config describes.
    ///
    /// An unparseable time zone falls back to the default with a warning
    /// rather than splitting day boundaries between two interpretations.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::new(UserId::new(self.admin_user_id))
            .with_feature_cap(VIEWS_FEATURE, self.views_daily_cap);

        match self.time_zone.parse() {
            Ok(tz) => config = config.with_time_zone(tz),
            Err(_) => {
                tracing::warn!(
                    time_zone = %self.time_zone,
                    "unknown time zone, keeping default"
                );
            }
        }

        config
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/numbot".into(),
            admin_user_id: 0,
            service_api_key: None,
            notify_webhook_url: None,
            time_zone: "Asia/Kolkata".into(),
            views_daily_cap: numbot_core::DEFAULT_DAILY_FEATURE_CAP,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
