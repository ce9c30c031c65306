//! Best-effort notification seam.
//!
//! Admin credit grants notify the target through whatever chat transport is
//! deployed alongside the engine. Delivery is best-effort: a failed
//! notification never undoes the mutation it announces.

use async_trait::async_trait;

use numbot_core::UserId;

/// A notification delivery failure.
#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers short messages to users out-of-band.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers log and move on.
    async fn notify(&self, user_id: UserId, message: &str) -> Result<(), NotifyError>;
}

/// A notifier that drops every message.
///
/// Used in tests and in deployments with no notification webhook configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _user_id: UserId, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
