//! Quota policy: who may do what, at what cost.

use numbot_core::{Decision, DenyReason, GrantOutcome, Role, UserId};
use numbot_store::Store;

use crate::error::Result;
use crate::CreditEngine;

impl<S: Store> CreditEngine<S> {
    /// Resolve a caller's role.
    ///
    /// Re-evaluated on every request — the allow-list is a durable table an
    /// admin can change between requests, so roles are never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn role_of(&self, user_id: UserId) -> Result<Role> {
        if user_id == self.config().admin_user_id {
            return Ok(Role::Admin);
        }
        if self.store().is_special(user_id)? {
            return Ok(Role::Special);
        }
        Ok(Role::Normal)
    }

    /// Decide whether `caller` may invoke `feature`, and at what cost.
    ///
    /// Precedence: block check, then (for capped features) the daily cap,
    /// then the role/balance gate. Any deny is terminal. As a side effect,
    /// the lazy daily grant is applied for normal callers — it persists even
    /// when the request is subsequently denied.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; no charge occurs in that case.
    pub fn evaluate(&self, caller: UserId, feature: &str) -> Result<Decision> {
        let today = self.config().service_day();
        let account =
            self.store()
                .ensure_account(caller, self.config().starting_credits, today)?;

        // Block is the highest-precedence check: it applies to every role,
        // including special accounts blocked after promotion.
        if self.store().is_blocked(caller)? {
            return Ok(Decision::deny(DenyReason::Blocked));
        }

        let role = self.role_of(caller)?;

        let mut credits = account.credits;
        if role == Role::Normal && account.grant_pending(today) {
            if let GrantOutcome::Granted { new_balance } = self.store().apply_daily_grant(
                caller,
                today,
                self.config().daily_grant_credits,
            )? {
                tracing::debug!(user_id = %caller, new_balance, "daily grant applied");
                credits = new_balance;
            }
        }

        // Capped features limit every role uniformly, unlike the credit gate.
        if let Some(cap) = self.config().feature_cap(feature) {
            if self.store().usage_count(caller, feature, today)? >= cap {
                return Ok(Decision::deny(DenyReason::DailyCapReached));
            }
        }

        if role.bypasses_credit_gate() {
            return Ok(Decision::allow(0));
        }

        let cost = self.config().feature_cost(feature);
        if credits >= cost {
            Ok(Decision::allow(cost))
        } else {
            Ok(Decision::deny(DenyReason::InsufficientCredits))
        }
    }
}
