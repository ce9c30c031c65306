//! Admin audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuditId, UserId};

/// An append-only record of a privileged mutation.
///
/// Every admin operation writes one of these regardless of outcome, so the
/// audit trail shows rejected attempts (already blocked, not special, ...)
/// as well as applied changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record id (ULID for time-ordering).
    pub id: AuditId,

    /// The admin who performed the action.
    pub actor: UserId,

    /// The account the action targeted.
    pub target: UserId,

    /// What was done.
    pub action: AdminAction,

    /// Outcome summary, e.g. `"applied"` or `"already_blocked"`.
    pub outcome: String,

    /// When the action was performed.
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a new audit record.
    #[must_use]
    pub fn new(
        actor: UserId,
        target: UserId,
        action: AdminAction,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditId::generate(),
            actor,
            target,
            action,
            outcome: outcome.into(),
            created_at: Utc::now(),
        }
    }
}

/// The privileged mutations an admin can perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AdminAction {
    /// Credits granted to the target.
    GrantCredits {
        /// Amount granted.
        amount: i64,
    },

    /// Credits revoked from the target (may drive the balance negative).
    RevokeCredits {
        /// Amount revoked.
        amount: i64,
    },

    /// Target blocked.
    Block {
        /// Reason supplied by the admin.
        reason: String,
    },

    /// Target unblocked.
    Unblock,

    /// Target promoted to the special allow-list.
    PromoteSpecial {
        /// Display name recorded for the listing.
        display_name: String,
    },

    /// Target demoted from the special allow-list.
    DemoteSpecial,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_record_serializes_action_tag() {
        let record = AuditRecord::new(
            UserId::new(1),
            UserId::new(555),
            AdminAction::Block {
                reason: "abuse".into(),
            },
            "applied",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"]["type"], "block");
        assert_eq!(json["outcome"], "applied");
    }
}
