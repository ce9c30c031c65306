//! Error types for numbot ledger storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// A failed store operation never silently proceeds as success; callers
/// treat any error here as "operation not charged".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Insufficient credits for a floored debit.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The feature's daily invocation cap is exhausted.
    #[error("daily cap reached: feature={feature}, cap={cap}")]
    DailyCapReached {
        /// The capped feature.
        feature: String,
        /// The configured daily cap.
        cap: u32,
    },

    /// Block requested for an account that already has an active block.
    #[error("already blocked")]
    AlreadyBlocked,

    /// Unblock requested for an account with no active block.
    #[error("not blocked")]
    NotBlocked,

    /// Promotion requested for an account already on the allow-list.
    #[error("already special")]
    AlreadySpecial,

    /// Demotion requested for an account not on the allow-list.
    #[error("not special")]
    NotSpecial,

    /// Settle requested for a charge that was already committed or refunded.
    #[error("charge already settled: {charge_id}")]
    ChargeAlreadySettled {
        /// The charge that was already settled.
        charge_id: String,
    },
}
