//! Error types for the numbot client SDK.

/// Errors returned by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A refund could not be applied server-side. Accounting-critical;
    /// surface this to an operator rather than retrying.
    #[error("refund failed for user {user_id}")]
    RefundFailed {
        /// The user left out of pocket.
        user_id: i64,
        /// The credits that were not returned.
        credits: i64,
    },

    /// The acting user is not the administrator.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Server-provided message.
        message: String,
    },

    /// The referenced charge or account does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Server-provided message.
        message: String,
    },

    /// A charge was settled twice.
    #[error("conflict: {message}")]
    Conflict {
        /// Server-provided message.
        message: String,
    },

    /// Any other API error.
    #[error("API error {status}: {code} - {message}")]
    Api {
        /// Stable error code.
        code: String,
        /// Human-readable message.
        message: String,
        /// HTTP status.
        status: u16,
    },
}
