//! Error types for the numbot engine.

use numbot_core::{ChargeId, UserId};
use numbot_store::StoreError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in engine operations.
///
/// Expected user-facing outcomes (deny reasons, grant results, redundant
/// admin actions) are typed results, not errors; this enum is for the
/// conditions the chat transport renders as "something went wrong".
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The ledger store failed; the operation was not charged.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A debit could not be returned after a failed operation.
    ///
    /// Accounting-critical: the user has paid for nothing and there is no
    /// automatic remediation. Logged at `error` and surfaced distinctly so
    /// operators can reconcile by hand.
    #[error("refund of {credits} credits failed for user {user_id}: {source}")]
    RefundFailed {
        /// The user left out of pocket.
        user_id: UserId,
        /// The amount that could not be returned.
        credits: i64,
        /// The underlying store failure.
        source: StoreError,
    },

    /// A privileged operation was attempted by a non-admin caller.
    #[error("caller {actor} is not the administrator")]
    NotAdmin {
        /// The caller that failed the admin check.
        actor: UserId,
    },

    /// An admin mutation was given a non-positive amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// A commit or refund referenced an unknown charge.
    #[error("charge not found: {0}")]
    ChargeNotFound(ChargeId),
}
