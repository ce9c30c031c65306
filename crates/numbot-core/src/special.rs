//! Special-user allow-list records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A member of the durable special-user allow-list.
///
/// Special users bypass the per-operation credit gate entirely. Membership
/// is a store table, not process state, so it survives restarts and admin
/// edits are atomic with the balance sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialUser {
    /// The promoted caller.
    pub user_id: UserId,

    /// Display name recorded at promotion time, for admin listings.
    pub display_name: String,

    /// The admin who promoted this user.
    pub promoted_by: UserId,

    /// When the promotion happened.
    pub promoted_at: DateTime<Utc>,
}

impl SpecialUser {
    /// Create a new allow-list record.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, promoted_by: UserId) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            promoted_by,
            promoted_at: Utc::now(),
        }
    }
}
