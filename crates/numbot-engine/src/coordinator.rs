//! Charge coordination: debit before the external call, refund when it
//! yields nothing.
//!
//! Charging first and refunding on a well-defined empty/error outcome bounds
//! the window in which a caller could double-spend through retries, while
//! still making failed lookups free. The refund is owned by a scope guard so
//! every exit path — including a panic or cancellation inside the wrapped
//! operation — returns the debit.

use std::fmt;
use std::future::Future;

use numbot_core::{ChargeId, ChargeRecord, ChargeState, Decision, DenyReason, UserId};
use numbot_store::{Store, StoreError};

use crate::error::{EngineError, Result};
use crate::CreditEngine;

/// Outcome of `begin_charge`: the wire-friendly evaluate-and-charge step.
#[derive(Debug, Clone)]
pub enum ChargeDecision {
    /// The operation may proceed. `charge` is present iff cost > 0; it must
    /// be committed or refunded once the external operation reports.
    Approved {
        /// The pending charge, if the caller paid for this operation.
        charge: Option<ChargeRecord>,
        /// Credits debited (0 for admin/special callers).
        cost: i64,
        /// Balance after the debit.
        balance: i64,
    },

    /// The operation was refused; nothing was charged.
    Denied {
        /// Why the request was refused.
        reason: DenyReason,
    },
}

/// Outcome of a fully coordinated `perform` call.
#[derive(Debug)]
pub enum PerformOutcome<T> {
    /// The operation produced a result; any charge is final.
    Completed {
        /// The external operation's result.
        value: T,
        /// Credits charged.
        cost: i64,
        /// Balance after the charge.
        balance: i64,
    },

    /// The quota policy refused the request; nothing was charged.
    Denied {
        /// Why the request was refused.
        reason: DenyReason,
    },

    /// The operation produced nothing usable; any charge was refunded.
    NoResult {
        /// Credits refunded (0 for free operations).
        refunded: i64,
        /// The operation's error, if it failed rather than came back empty.
        error: Option<String>,
    },
}

/// Refunds a pending charge on drop unless disarmed.
///
/// Held across the external operation so that a panic or a dropped future
/// still returns the debit. The normal paths disarm it and settle through
/// the engine, where a refund failure can be surfaced; the drop path can
/// only log.
struct ChargeGuard<'a, S: Store> {
    store: &'a S,
    charge: Option<ChargeRecord>,
}

impl<'a, S: Store> ChargeGuard<'a, S> {
    fn new(store: &'a S, charge: Option<ChargeRecord>) -> Self {
        Self { store, charge }
    }

    fn disarm(&mut self) -> Option<ChargeRecord> {
        self.charge.take()
    }
}

impl<S: Store> Drop for ChargeGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(charge) = self.charge.take() {
            match self.store.settle_charge(charge.id, ChargeState::Refunded) {
                Ok(_) => {
                    tracing::warn!(
                        charge_id = %charge.id,
                        user_id = %charge.user_id,
                        credits = charge.credits,
                        "charge refunded on abnormal exit"
                    );
                }
                Err(error) => {
                    tracing::error!(
                        charge_id = %charge.id,
                        user_id = %charge.user_id,
                        credits = charge.credits,
                        %error,
                        "refund failed on abnormal exit; manual reconciliation required"
                    );
                }
            }
        }
    }
}

impl<S: Store> CreditEngine<S> {
    /// Evaluate a request and, if allowed at cost > 0, atomically debit the
    /// caller and open a pending charge.
    ///
    /// The balance and any feature cap are re-checked inside the store's
    /// atomic compound operation, so two racing requests can never both
    /// spend the last credit. For cost-0 callers on a capped feature, only
    /// the counter is consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; nothing is charged in that case.
    pub fn begin_charge(&self, caller: UserId, feature: &str) -> Result<ChargeDecision> {
        let cost = match self.evaluate(caller, feature)? {
            Decision::Deny { reason } => return Ok(ChargeDecision::Denied { reason }),
            Decision::Allow { cost } => cost,
        };

        let today = self.config().service_day();
        let cap = self.config().feature_cap(feature).map(|cap| (today, cap));

        if cost == 0 {
            if let Some((day, cap)) = cap {
                match self.store().increment_usage(caller, feature, day, cap) {
                    Ok(_) => {}
                    Err(StoreError::DailyCapReached { .. }) => {
                        return Ok(ChargeDecision::Denied {
                            reason: DenyReason::DailyCapReached,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            let balance = self
                .store()
                .get_account(caller)?
                .map_or(0, |account| account.credits);
            return Ok(ChargeDecision::Approved {
                charge: None,
                cost: 0,
                balance,
            });
        }

        let record = ChargeRecord::open(caller, feature, cost);
        match self.store().open_charge(&record, cap) {
            Ok(balance) => {
                tracing::debug!(
                    charge_id = %record.id,
                    user_id = %caller,
                    feature,
                    cost,
                    balance,
                    "charge opened"
                );
                Ok(ChargeDecision::Approved {
                    charge: Some(record),
                    cost,
                    balance,
                })
            }
            Err(StoreError::InsufficientCredits { .. }) => Ok(ChargeDecision::Denied {
                reason: DenyReason::InsufficientCredits,
            }),
            Err(StoreError::DailyCapReached { .. }) => Ok(ChargeDecision::Denied {
                reason: DenyReason::DailyCapReached,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Commit a pending charge: the external operation produced a usable
    /// result, so the debit is final.
    ///
    /// # Errors
    ///
    /// - `EngineError::ChargeNotFound` for an unknown charge id.
    /// - `EngineError::Storage` if the charge was already settled or the
    ///   store fails.
    pub fn commit_charge(&self, charge_id: ChargeId) -> Result<ChargeRecord> {
        match self.store().settle_charge(charge_id, ChargeState::Committed) {
            Ok(charge) => Ok(charge),
            Err(StoreError::NotFound) => Err(EngineError::ChargeNotFound(charge_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Refund a pending charge: the external operation produced nothing.
    ///
    /// # Errors
    ///
    /// - `EngineError::ChargeNotFound` for an unknown charge id.
    /// - `EngineError::RefundFailed` if the store fails while returning the
    ///   credits — an accounting discrepancy, logged at `error` and never
    ///   swallowed.
    pub fn refund_charge(&self, charge_id: ChargeId) -> Result<ChargeRecord> {
        let charge = self
            .store()
            .get_charge(charge_id)?
            .ok_or(EngineError::ChargeNotFound(charge_id))?;

        match self.store().settle_charge(charge_id, ChargeState::Refunded) {
            Ok(settled) => {
                tracing::info!(
                    charge_id = %charge_id,
                    user_id = %settled.user_id,
                    credits = settled.credits,
                    "charge refunded"
                );
                Ok(settled)
            }
            Err(e @ (StoreError::ChargeAlreadySettled { .. } | StoreError::NotFound)) => {
                Err(e.into())
            }
            Err(source) => {
                tracing::error!(
                    charge_id = %charge_id,
                    user_id = %charge.user_id,
                    credits = charge.credits,
                    error = %source,
                    "refund failed; manual reconciliation required"
                );
                Err(EngineError::RefundFailed {
                    user_id: charge.user_id,
                    credits: charge.credits,
                    source,
                })
            }
        }
    }

    /// Run `op` as a coordinated, charged unit.
    ///
    /// The caller is charged before `op` runs. `Ok(Some(value))` commits the
    /// charge; `Ok(None)` (no usable result) and `Err(_)` refund it. No
    /// in-process lock is held while `op` is in flight, and the pending
    /// charge is refunded even if `op` panics or the future is dropped.
    /// Timeouts are `op`'s own concern and surface as `Err` or `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; `EngineError::RefundFailed`
    /// specifically when a due refund could not be applied.
    pub async fn perform<T, E, F, Fut>(
        &self,
        caller: UserId,
        feature: &str,
        op: F,
    ) -> Result<PerformOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, E>>,
        E: fmt::Display,
    {
        let (charge, cost, balance) = match self.begin_charge(caller, feature)? {
            ChargeDecision::Denied { reason } => return Ok(PerformOutcome::Denied { reason }),
            ChargeDecision::Approved {
                charge,
                cost,
                balance,
            } => (charge, cost, balance),
        };

        let mut guard = ChargeGuard::new(self.store(), charge);

        let result = op().await;

        match result {
            Ok(Some(value)) => {
                if let Some(charge) = guard.disarm() {
                    self.commit_charge(charge.id)?;
                }
                Ok(PerformOutcome::Completed {
                    value,
                    cost,
                    balance,
                })
            }
            Ok(None) => {
                let refunded = self.settle_refund(&mut guard)?;
                Ok(PerformOutcome::NoResult {
                    refunded,
                    error: None,
                })
            }
            Err(error) => {
                let refunded = self.settle_refund(&mut guard)?;
                Ok(PerformOutcome::NoResult {
                    refunded,
                    error: Some(error.to_string()),
                })
            }
        }
    }

    /// Disarm the guard and refund through the fallible engine path.
    fn settle_refund(&self, guard: &mut ChargeGuard<'_, S>) -> Result<i64> {
        match guard.disarm() {
            Some(charge) => {
                self.refund_charge(charge.id)?;
                Ok(charge.credits)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use numbot_core::UserId;
    use numbot_store::RocksStore;
    use tempfile::TempDir;

    use super::*;
    use crate::EngineConfig;

    const ADMIN: UserId = UserId::new(1);

    fn create_engine() -> (Arc<CreditEngine<RocksStore>>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let engine = Arc::new(CreditEngine::new(store, EngineConfig::new(ADMIN)));
        (engine, dir)
    }

    fn seed_account(engine: &CreditEngine<RocksStore>, user_id: UserId, credits: i64) {
        let today = engine.config().service_day();
        engine.store().ensure_account(user_id, credits, today).unwrap();
    }

    async fn lookup_ok() -> std::result::Result<Option<String>, Infallible> {
        Ok(Some("record".to_string()))
    }

    async fn lookup_empty() -> std::result::Result<Option<String>, Infallible> {
        Ok(None)
    }

    #[tokio::test]
    async fn first_request_of_new_user_charges_one_credit() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(555);

        let outcome = engine.perform(user_id, "lookup", lookup_ok).await.unwrap();

        match outcome {
            PerformOutcome::Completed { value, cost, balance } => {
                assert_eq!(value, "record");
                assert_eq!(cost, 1);
                assert_eq!(balance, 4);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(engine.get_balance(user_id).unwrap(), 4);
    }

    #[tokio::test]
    async fn empty_result_is_free() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(2);
        seed_account(&engine, user_id, 3);

        // Any number of sequential empty lookups nets to zero.
        for _ in 0..4 {
            let outcome = engine.perform(user_id, "lookup", lookup_empty).await.unwrap();
            match outcome {
                PerformOutcome::NoResult { refunded, error } => {
                    assert_eq!(refunded, 1);
                    assert!(error.is_none());
                }
                other => panic!("expected NoResult, got {other:?}"),
            }
        }
        assert_eq!(engine.get_balance(user_id).unwrap(), 3);
    }

    #[tokio::test]
    async fn failed_operation_is_refunded_with_error() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(3);
        seed_account(&engine, user_id, 2);

        let outcome = engine
            .perform(user_id, "lookup", || async {
                Err::<Option<String>, _>("upstream timed out")
            })
            .await
            .unwrap();

        match outcome {
            PerformOutcome::NoResult { refunded, error } => {
                assert_eq!(refunded, 1);
                assert_eq!(error.as_deref(), Some("upstream timed out"));
            }
            other => panic!("expected NoResult, got {other:?}"),
        }
        assert_eq!(engine.get_balance(user_id).unwrap(), 2);
    }

    #[tokio::test]
    async fn denied_request_runs_no_operation() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(4);
        seed_account(&engine, user_id, 0);

        let outcome = engine
            .perform::<String, Infallible, _, _>(user_id, "lookup", || async {
                panic!("the external operation must not run on a deny")
            })
            .await
            .unwrap();

        match outcome {
            PerformOutcome::Denied { reason } => {
                assert_eq!(reason, DenyReason::InsufficientCredits);
            }
            other => panic!("expected Denied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admin_operations_are_free() {
        let (engine, _dir) = create_engine();
        seed_account(&engine, ADMIN, 0);

        let outcome = engine.perform(ADMIN, "lookup", lookup_ok).await.unwrap();
        match outcome {
            PerformOutcome::Completed { cost, .. } => assert_eq!(cost, 0),
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(engine.get_balance(ADMIN).unwrap(), 0);
    }

    #[tokio::test]
    async fn panicking_operation_refunds_via_guard() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(5);
        seed_account(&engine, user_id, 2);

        let task_engine = Arc::clone(&engine);
        let handle = tokio::spawn(async move {
            task_engine
                .perform::<String, Infallible, _, _>(user_id, "lookup", || async {
                    panic!("lookup formatter blew up")
                })
                .await
        });

        assert!(handle.await.is_err());
        assert_eq!(engine.get_balance(user_id).unwrap(), 2);
    }

    #[tokio::test]
    async fn cancelled_operation_refunds_via_guard() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(6);
        seed_account(&engine, user_id, 2);

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            engine.perform(user_id, "lookup", || async {
                futures_pending().await;
                Ok::<Option<String>, Infallible>(None)
            }),
        )
        .await;

        assert!(result.is_err()); // Timed out; the perform future was dropped.
        assert_eq!(engine.get_balance(user_id).unwrap(), 2);
    }

    async fn futures_pending() {
        std::future::pending::<()>().await;
    }

    #[tokio::test]
    async fn concurrent_performs_never_overspend() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(7);
        seed_account(&engine, user_id, 3);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine.perform(user_id, "lookup", lookup_ok).await.unwrap()
            }));
        }

        let mut completed = 0;
        let mut denied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                PerformOutcome::Completed { .. } => completed += 1,
                PerformOutcome::Denied {
                    reason: DenyReason::InsufficientCredits,
                } => denied += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(completed, 3);
        assert_eq!(denied, 7);
        assert_eq!(engine.get_balance(user_id).unwrap(), 0);
    }

    #[tokio::test]
    async fn capped_feature_denies_after_cap_despite_balance() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(8);
        seed_account(&engine, user_id, 100);

        for _ in 0..5 {
            let outcome = engine
                .perform(user_id, crate::VIEWS_FEATURE, lookup_ok)
                .await
                .unwrap();
            assert!(matches!(outcome, PerformOutcome::Completed { .. }));
        }

        let outcome = engine
            .perform(user_id, crate::VIEWS_FEATURE, lookup_ok)
            .await
            .unwrap();
        match outcome {
            PerformOutcome::Denied { reason } => {
                assert_eq!(reason, DenyReason::DailyCapReached);
            }
            other => panic!("expected Denied, got {other:?}"),
        }
        assert_eq!(engine.get_balance(user_id).unwrap(), 95);
    }

    #[tokio::test]
    async fn commit_and_refund_settle_exactly_once() {
        let (engine, _dir) = create_engine();
        let user_id = UserId::new(9);
        seed_account(&engine, user_id, 5);

        let decision = engine.begin_charge(user_id, "lookup").unwrap();
        let charge = match decision {
            ChargeDecision::Approved { charge: Some(charge), .. } => charge,
            other => panic!("expected an approved paid charge, got {other:?}"),
        };

        engine.commit_charge(charge.id).unwrap();
        assert!(matches!(
            engine.refund_charge(charge.id),
            Err(EngineError::Storage(StoreError::ChargeAlreadySettled { .. }))
        ));
        assert_eq!(engine.get_balance(user_id).unwrap(), 4);
    }

    #[tokio::test]
    async fn unknown_charge_is_reported() {
        let (engine, _dir) = create_engine();

        let missing = numbot_core::ChargeId::generate();
        assert!(matches!(
            engine.commit_charge(missing),
            Err(EngineError::ChargeNotFound(_))
        ));
        assert!(matches!(
            engine.refund_charge(missing),
            Err(EngineError::ChargeNotFound(_))
        ));
    }
}
