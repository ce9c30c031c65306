//! Block records for administratively suspended accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A record of an active administrative block.
///
/// Exists iff the account is currently blocked; removed on unblock. The
/// paired `Account::is_blocked` flag is maintained in the same atomic write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    /// The blocked caller.
    pub user_id: UserId,

    /// The admin who issued the block.
    pub blocked_by: UserId,

    /// Human-readable reason, shown to operators (not to the blocked user).
    pub reason: String,

    /// When the block was issued.
    pub created_at: DateTime<Utc>,
}

impl BlockRecord {
    /// Create a new block record.
    #[must_use]
    pub fn new(user_id: UserId, blocked_by: UserId, reason: impl Into<String>) -> Self {
        Self {
            user_id,
            blocked_by,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}
