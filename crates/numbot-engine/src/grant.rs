//! Daily grant scheduling.
//!
//! There is no background process: the grant is a lazy check performed as a
//! side effect of quota evaluation and of the explicit claim request below.
//! The idempotency key is (user, calendar day in the configured time zone).

use numbot_core::{ClaimOutcome, GrantOutcome, Role, UserId};
use numbot_store::Store;

use crate::error::Result;
use crate::CreditEngine;

impl<S: Store> CreditEngine<S> {
    /// Handle an explicit "claim daily credits" request.
    ///
    /// Claiming twice in the same calendar day is a no-op the second time
    /// and reports when the last grant was applied, rather than erroring.
    /// Admin and special accounts have nothing to claim, and blocked
    /// accounts cannot claim at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn claim_daily_grant(&self, caller: UserId) -> Result<ClaimOutcome> {
        let today = self.config().service_day();
        let account =
            self.store()
                .ensure_account(caller, self.config().starting_credits, today)?;

        if self.store().is_blocked(caller)? {
            return Ok(ClaimOutcome::Blocked);
        }

        let role = self.role_of(caller)?;
        if role != Role::Normal {
            return Ok(ClaimOutcome::NotEligible { role });
        }

        match self
            .store()
            .apply_daily_grant(caller, today, self.config().daily_grant_credits)?
        {
            GrantOutcome::Granted { new_balance } => {
                tracing::info!(user_id = %caller, new_balance, "daily credits claimed");
                Ok(ClaimOutcome::Granted { new_balance })
            }
            GrantOutcome::AlreadyClaimed { claimed_on } => Ok(ClaimOutcome::AlreadyClaimed {
                claimed_on,
                balance: account.credits,
            }),
        }
    }
}
