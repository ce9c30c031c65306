//! Quota decisions and outcome types.
//!
//! Deny reasons, grant outcomes, and balance changes are expected
//! user-facing results, so they are plain data the caller renders into chat
//! messages — never errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Role;

/// The quota policy's verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum Decision {
    /// The operation may proceed at the given cost (0 for admin/special).
    Allow {
        /// Credits the operation will cost.
        cost: i64,
    },

    /// The operation is rejected; nothing was charged.
    Deny {
        /// Why the request was refused.
        reason: DenyReason,
    },
}

impl Decision {
    /// Convenience constructor for an allow decision.
    #[must_use]
    pub const fn allow(cost: i64) -> Self {
        Self::Allow { cost }
    }

    /// Convenience constructor for a deny decision.
    #[must_use]
    pub const fn deny(reason: DenyReason) -> Self {
        Self::Deny { reason }
    }

    /// Whether the decision permits the operation.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Why a request was refused.
///
/// Each reason maps to a distinct, specific message; the chat transport is
/// responsible for rendering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The account is administratively blocked. Highest precedence.
    Blocked,

    /// A normal account with no credits left.
    InsufficientCredits,

    /// The feature's per-day invocation cap is exhausted.
    DailyCapReached,
}

impl DenyReason {
    /// Stable wire code for this reason.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::InsufficientCredits => "insufficient_credits",
            Self::DailyCapReached => "daily_cap_reached",
        }
    }

    /// Message shown to the denied caller.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Blocked => "Your account has been blocked. Contact the administrator.",
            Self::InsufficientCredits => {
                "You have no credits left. Claim your daily credits or contact the administrator."
            }
            Self::DailyCapReached => "You have reached today's limit for this feature. Try again tomorrow.",
        }
    }
}

/// Result of applying (or re-applying) the daily grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum GrantOutcome {
    /// The grant was applied.
    Granted {
        /// Balance after the grant.
        new_balance: i64,
    },

    /// The grant was already applied this calendar day.
    AlreadyClaimed {
        /// The day the last grant was applied.
        claimed_on: NaiveDate,
    },
}

/// Result of an explicit "claim daily credits" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ClaimOutcome {
    /// Credits were granted.
    Granted {
        /// Balance after the grant.
        new_balance: i64,
    },

    /// Already claimed today; reports when, and the unchanged balance.
    AlreadyClaimed {
        /// The day the last grant was applied.
        claimed_on: NaiveDate,
        /// Balance, unchanged by this call.
        balance: i64,
    },

    /// Admin and special accounts have no daily grant to claim.
    NotEligible {
        /// The caller's role.
        role: Role,
    },

    /// Blocked accounts cannot claim.
    Blocked,
}

/// A balance mutation's before/after pair, as reported to admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    /// Balance before the mutation.
    pub previous: i64,
    /// Balance after the mutation.
    pub new: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_reasons_have_distinct_messages() {
        let reasons = [
            DenyReason::Blocked,
            DenyReason::InsufficientCredits,
            DenyReason::DailyCapReached,
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in &reasons[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn decision_allow_carries_cost() {
        let decision = Decision::allow(1);
        assert!(decision.is_allowed());
        assert_eq!(decision, Decision::Allow { cost: 1 });
    }

    #[test]
    fn deny_is_not_allowed() {
        assert!(!Decision::deny(DenyReason::Blocked).is_allowed());
    }
}
