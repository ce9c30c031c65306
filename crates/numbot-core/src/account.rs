//! Account and role types for the numbot credit engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

// ============================================================================
// Constants
// ============================================================================

/// Credits a freshly created normal account starts with.
pub const DEFAULT_STARTING_CREDITS: i64 = 5;

/// Credits granted once per calendar day to every normal account.
pub const DAILY_GRANT_CREDITS: i64 = 10;

/// Sentinel balance assigned when an account is promoted to special status.
pub const SPECIAL_BALANCE_CREDITS: i64 = 999;

/// Cost of a paid lookup when no per-feature override is configured.
pub const DEFAULT_LOOKUP_COST: i64 = 1;

/// Daily invocation cap for rate-limited features when no override is
/// configured.
pub const DEFAULT_DAILY_FEATURE_CAP: u32 = 5;

/// A ledger account, one per caller id.
///
/// Accounts are created lazily on a caller's first interaction and are never
/// hard-deleted; blocking is a soft state carried alongside the balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The caller this account belongs to.
    pub user_id: UserId,

    /// Current spendable credit balance.
    ///
    /// Never driven negative by a normal charge; an admin revoke may leave
    /// it negative, in which case future daily grants repay the debt.
    pub credits: i64,

    /// The calendar day the last daily grant was applied, if any.
    pub last_grant_date: Option<NaiveDate>,

    /// Whether the account is administratively blocked.
    ///
    /// Kept in lockstep with the block-record table; a blocked account
    /// accepts no chargeable operations regardless of balance or role.
    pub is_blocked: bool,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with the default starting balance.
    #[must_use]
    pub fn new(user_id: UserId, starting_credits: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            credits: starting_credits,
            last_grant_date: None,
            is_blocked: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account can cover a charge of `cost` credits.
    #[must_use]
    pub fn has_sufficient_credits(&self, cost: i64) -> bool {
        self.credits >= cost
    }

    /// Check whether the daily grant is still outstanding for `day`.
    #[must_use]
    pub fn grant_pending(&self, day: NaiveDate) -> bool {
        self.last_grant_date != Some(day)
    }
}

/// A caller's role, derived fresh on every request.
///
/// Roles are never cached across requests: the special allow-list is a
/// durable table an admin can change at any moment, and the admin id is
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The configured singleton administrator.
    Admin,

    /// Member of the special allow-list; bypasses the credit gate.
    Special,

    /// Everyone else; pays per operation out of their balance.
    Normal,
}

impl Role {
    /// Whether this role bypasses the per-operation credit cost.
    #[must_use]
    pub const fn bypasses_credit_gate(&self) -> bool {
        matches!(self, Self::Admin | Self::Special)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_starting_balance() {
        let account = Account::new(UserId::new(555), DEFAULT_STARTING_CREDITS);
        assert_eq!(account.credits, 5);
        assert!(account.last_grant_date.is_none());
        assert!(!account.is_blocked);
    }

    #[test]
    fn account_sufficient_credits() {
        let mut account = Account::new(UserId::new(1), 0);
        account.credits = 2;

        assert!(account.has_sufficient_credits(1));
        assert!(account.has_sufficient_credits(2));
        assert!(!account.has_sufficient_credits(3));
    }

    #[test]
    fn grant_pending_tracks_last_grant_date() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let mut account = Account::new(UserId::new(1), 5);

        assert!(account.grant_pending(day));
        account.last_grant_date = Some(day);
        assert!(!account.grant_pending(day));
        assert!(account.grant_pending(day.succ_opt().unwrap()));
    }

    #[test]
    fn role_credit_gate_bypass() {
        assert!(Role::Admin.bypasses_credit_gate());
        assert!(Role::Special.bypasses_credit_gate());
        assert!(!Role::Normal.bypasses_credit_gate());
    }
}
