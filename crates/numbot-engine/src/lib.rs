//! Quota policy, charge coordination, and admin control for numbot.
//!
//! `CreditEngine` is the single entry point the chat-transport and
//! feature-handler collaborators call into:
//!
//! - **Quota Policy** — [`CreditEngine::evaluate`]: block check, fresh role
//!   resolution, lazy daily grant, per-feature daily caps, balance gate.
//! - **Charge Coordinator** — [`CreditEngine::perform`] for in-process
//!   callers (charge before the external call, guaranteed refund when it
//!   yields nothing), plus the wire-friendly
//!   [`CreditEngine::begin_charge`] / [`CreditEngine::commit_charge`] /
//!   [`CreditEngine::refund_charge`] primitives.
//! - **Admin Control** — privileged mutations gated on the configured admin
//!   id, audited, with best-effort target notification.
//! - **Daily Grant Scheduler** — lazy top-up on evaluation plus the explicit
//!   [`CreditEngine::claim_daily_grant`].
//!
//! The engine holds no cross-request state: every read goes back to the
//! [`Store`], and no in-process lock is held across an external operation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod admin;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod grant;
pub mod notify;
pub mod policy;

pub use admin::{BlockOutcome, DemoteOutcome, PromoteOutcome, UnblockOutcome};
pub use config::{EngineConfig, VIEWS_FEATURE};
pub use coordinator::{ChargeDecision, PerformOutcome};
pub use error::{EngineError, Result};
pub use notify::{Notifier, NoopNotifier, NotifyError};

use std::sync::Arc;

use numbot_core::{HistoryRecord, UserId};
use numbot_store::Store;

/// The credit-and-quota accounting engine.
///
/// Cheap to clone behind `Arc`; all state lives in the store.
pub struct CreditEngine<S: Store> {
    store: Arc<S>,
    config: EngineConfig,
    notifier: Option<Arc<dyn Notifier>>,
}

impl<S: Store> CreditEngine<S> {
    /// Create an engine over `store` with `config` and no notifier.
    #[must_use]
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            notifier: None,
        }
    }

    /// Attach a notifier for best-effort admin-grant notifications.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn notifier(&self) -> Option<&Arc<dyn Notifier>> {
        self.notifier.as_ref()
    }

    /// A caller's current balance, creating the account if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_balance(&self, user_id: UserId) -> Result<i64> {
        let account = self.store.ensure_account(
            user_id,
            self.config.starting_credits,
            self.config.service_day(),
        )?;
        Ok(account.credits)
    }

    /// Whether a caller has an active block.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn is_blocked(&self, user_id: UserId) -> Result<bool> {
        Ok(self.store.is_blocked(user_id)?)
    }

    /// Append a query to the caller's history.
    ///
    /// Called by feature handlers after a successful lookup; append-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn record_history(
        &self,
        user_id: UserId,
        query: impl Into<String>,
        feature: impl Into<String>,
    ) -> Result<HistoryRecord> {
        let record = HistoryRecord::new(user_id, query, feature);
        self.store.append_history(&record)?;
        Ok(record)
    }
}
