//! Admin control: privileged mutations with auditability.
//!
//! Every operation re-checks the caller against the configured admin id —
//! the check is never cached — and appends an audit record whether the
//! mutation applied or was rejected as redundant.

use std::sync::Arc;

use numbot_core::{
    Account, AdminAction, AuditRecord, BalanceChange, BlockRecord, HistoryRecord, SpecialUser,
    UserId,
};
use numbot_store::{Store, StoreError};

use crate::error::{EngineError, Result};
use crate::CreditEngine;

/// Outcome of a block request.
#[derive(Debug, Clone)]
pub enum BlockOutcome {
    /// The block was applied.
    Blocked(BlockRecord),
    /// The target already had an active block; nothing changed.
    AlreadyBlocked,
}

/// Outcome of an unblock request.
#[derive(Debug, Clone)]
pub enum UnblockOutcome {
    /// The block was lifted.
    Unblocked(BlockRecord),
    /// The target had no active block; nothing changed.
    NotBlocked,
}

/// Outcome of a promotion request.
#[derive(Debug, Clone)]
pub enum PromoteOutcome {
    /// The target joined the allow-list.
    Promoted(SpecialUser),
    /// The target was already on the allow-list; nothing changed.
    AlreadySpecial,
}

/// Outcome of a demotion request.
#[derive(Debug, Clone)]
pub enum DemoteOutcome {
    /// The target left the allow-list.
    Demoted(SpecialUser),
    /// The target was not on the allow-list; nothing changed.
    NotSpecial,
}

impl<S: Store> CreditEngine<S> {
    /// Verify `actor` is the configured administrator.
    fn require_admin(&self, actor: UserId) -> Result<()> {
        if actor == self.config().admin_user_id {
            Ok(())
        } else {
            tracing::warn!(actor = %actor, "admin operation rejected for non-admin caller");
            Err(EngineError::NotAdmin { actor })
        }
    }

    /// Make sure the target account exists before mutating it.
    fn ensure_target(&self, target: UserId) -> Result<()> {
        self.store().ensure_account(
            target,
            self.config().starting_credits,
            self.config().service_day(),
        )?;
        Ok(())
    }

    fn audit(&self, actor: UserId, target: UserId, action: AdminAction, outcome: &str) -> Result<()> {
        self.store()
            .append_audit(&AuditRecord::new(actor, target, action, outcome))?;
        Ok(())
    }

    /// Fire-and-forget a notification if a notifier is configured.
    fn notify_best_effort(&self, target: UserId, message: String) {
        if let Some(notifier) = self.notifier() {
            let notifier = Arc::clone(notifier);
            tokio::spawn(async move {
                if let Err(error) = notifier.notify(target, &message).await {
                    tracing::warn!(user_id = %target, %error, "notification not delivered");
                }
            });
        }
    }

    /// Grant `amount` credits to `target`.
    ///
    /// Returns the previous and new balance. The target is notified
    /// best-effort; a delivery failure does not undo the grant.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotAdmin` if `actor` is not the administrator.
    /// - `EngineError::InvalidAmount` for a non-positive amount.
    pub fn grant_credits(
        &self,
        actor: UserId,
        target: UserId,
        amount: i64,
    ) -> Result<BalanceChange> {
        self.require_admin(actor)?;
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(amount));
        }
        self.ensure_target(target)?;

        let change = self.store().adjust_credits(target, amount, None)?;
        self.audit(actor, target, AdminAction::GrantCredits { amount }, "applied")?;
        tracing::info!(
            actor = %actor,
            target = %target,
            amount,
            previous = change.previous,
            new = change.new,
            "credits granted"
        );

        self.notify_best_effort(
            target,
            format!("You received {amount} credits. New balance: {}.", change.new),
        );

        Ok(change)
    }

    /// Revoke `amount` credits from `target`.
    ///
    /// Admin-forced debits have no floor: the balance may go negative, and
    /// the debt is repaid out of future daily grants.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotAdmin` if `actor` is not the administrator.
    /// - `EngineError::InvalidAmount` for a non-positive amount.
    pub fn revoke_credits(
        &self,
        actor: UserId,
        target: UserId,
        amount: i64,
    ) -> Result<BalanceChange> {
        self.require_admin(actor)?;
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(amount));
        }
        self.ensure_target(target)?;

        let change = self.store().adjust_credits(target, -amount, None)?;
        self.audit(actor, target, AdminAction::RevokeCredits { amount }, "applied")?;
        tracing::info!(
            actor = %actor,
            target = %target,
            amount,
            previous = change.previous,
            new = change.new,
            "credits revoked"
        );

        Ok(change)
    }

    /// Block `target`. A redundant block is reported, not an error.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator,
    /// or a storage error.
    pub fn block(
        &self,
        actor: UserId,
        target: UserId,
        reason: impl Into<String>,
    ) -> Result<BlockOutcome> {
        self.require_admin(actor)?;
        self.ensure_target(target)?;

        let reason = reason.into();
        let record = BlockRecord::new(target, actor, reason.clone());
        let action = AdminAction::Block { reason };

        match self.store().insert_block(&record) {
            Ok(()) => {
                self.audit(actor, target, action, "applied")?;
                tracing::info!(actor = %actor, target = %target, "user blocked");
                Ok(BlockOutcome::Blocked(record))
            }
            Err(StoreError::AlreadyBlocked) => {
                self.audit(actor, target, action, "already_blocked")?;
                Ok(BlockOutcome::AlreadyBlocked)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unblock `target`. A redundant unblock is reported, not an error.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator,
    /// or a storage error.
    pub fn unblock(&self, actor: UserId, target: UserId) -> Result<UnblockOutcome> {
        self.require_admin(actor)?;
        self.ensure_target(target)?;

        match self.store().remove_block(target) {
            Ok(record) => {
                self.audit(actor, target, AdminAction::Unblock, "applied")?;
                tracing::info!(actor = %actor, target = %target, "user unblocked");
                Ok(UnblockOutcome::Unblocked(record))
            }
            Err(StoreError::NotBlocked) => {
                self.audit(actor, target, AdminAction::Unblock, "not_blocked")?;
                Ok(UnblockOutcome::NotBlocked)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Promote `target` onto the special allow-list.
    ///
    /// Sets the balance to the configured sentinel. Redundant promotion is
    /// reported, not an error.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator,
    /// or a storage error.
    pub fn promote_special(
        &self,
        actor: UserId,
        target: UserId,
        display_name: impl Into<String>,
    ) -> Result<PromoteOutcome> {
        self.require_admin(actor)?;
        self.ensure_target(target)?;

        let display_name = display_name.into();
        let record = SpecialUser::new(target, display_name.clone(), actor);
        let action = AdminAction::PromoteSpecial { display_name };

        match self
            .store()
            .insert_special(&record, self.config().special_credits)
        {
            Ok(()) => {
                self.audit(actor, target, action, "applied")?;
                tracing::info!(actor = %actor, target = %target, "user promoted to special");
                Ok(PromoteOutcome::Promoted(record))
            }
            Err(StoreError::AlreadySpecial) => {
                self.audit(actor, target, action, "already_special")?;
                Ok(PromoteOutcome::AlreadySpecial)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Demote `target` from the special allow-list.
    ///
    /// Resets the balance to the normal starting balance. Redundant
    /// demotion is reported, not an error.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator,
    /// or a storage error.
    pub fn demote_special(&self, actor: UserId, target: UserId) -> Result<DemoteOutcome> {
        self.require_admin(actor)?;
        self.ensure_target(target)?;

        match self
            .store()
            .remove_special(target, self.config().starting_credits)
        {
            Ok(record) => {
                self.audit(actor, target, AdminAction::DemoteSpecial, "applied")?;
                tracing::info!(actor = %actor, target = %target, "user demoted from special");
                Ok(DemoteOutcome::Demoted(record))
            }
            Err(StoreError::NotSpecial) => {
                self.audit(actor, target, AdminAction::DemoteSpecial, "not_special")?;
                Ok(DemoteOutcome::NotSpecial)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List every account.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator.
    pub fn list_users(&self, actor: UserId) -> Result<Vec<Account>> {
        self.require_admin(actor)?;
        Ok(self.store().list_accounts()?)
    }

    /// List the special allow-list.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator.
    pub fn list_special_users(&self, actor: UserId) -> Result<Vec<SpecialUser>> {
        self.require_admin(actor)?;
        Ok(self.store().list_specials()?)
    }

    /// Read a user's query history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator.
    pub fn user_history(
        &self,
        actor: UserId,
        target: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRecord>> {
        self.require_admin(actor)?;
        Ok(self.store().list_history(target, limit, offset)?)
    }

    /// Read the admin audit log, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotAdmin` if `actor` is not the administrator.
    pub fn audit_log(&self, actor: UserId, limit: usize, offset: usize) -> Result<Vec<AuditRecord>> {
        self.require_admin(actor)?;
        Ok(self.store().list_audit(limit, offset)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use numbot_core::{DenyReason, Decision};
    use numbot_store::RocksStore;
    use tempfile::TempDir;

    use super::*;
    use crate::EngineConfig;

    const ADMIN: UserId = UserId::new(1);
    const TARGET: UserId = UserId::new(555);

    fn create_engine() -> (CreditEngine<RocksStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let engine = CreditEngine::new(store, EngineConfig::new(ADMIN));
        (engine, dir)
    }

    #[test]
    fn non_admin_callers_are_rejected() {
        let (engine, _dir) = create_engine();
        let imposter = UserId::new(666);

        assert!(matches!(
            engine.grant_credits(imposter, TARGET, 10),
            Err(EngineError::NotAdmin { .. })
        ));
        assert!(matches!(
            engine.block(imposter, TARGET, "nope"),
            Err(EngineError::NotAdmin { .. })
        ));
        assert!(matches!(
            engine.list_users(imposter),
            Err(EngineError::NotAdmin { .. })
        ));
    }

    #[test]
    fn grant_reports_previous_and_new_balance() {
        let (engine, _dir) = create_engine();

        let change = engine.grant_credits(ADMIN, TARGET, 20).unwrap();
        assert_eq!(change, BalanceChange { previous: 5, new: 25 });
    }

    #[test]
    fn non_positive_amounts_are_invalid() {
        let (engine, _dir) = create_engine();

        assert!(matches!(
            engine.grant_credits(ADMIN, TARGET, 0),
            Err(EngineError::InvalidAmount(0))
        ));
        assert!(matches!(
            engine.revoke_credits(ADMIN, TARGET, -5),
            Err(EngineError::InvalidAmount(-5))
        ));
    }

    #[test]
    fn revoke_can_drive_balance_negative() {
        let (engine, _dir) = create_engine();
        let today = engine.config().service_day();
        engine.store().ensure_account(TARGET, 2, today).unwrap();

        let change = engine.revoke_credits(ADMIN, TARGET, 5).unwrap();
        assert_eq!(change, BalanceChange { previous: 2, new: -3 });
        assert_eq!(engine.get_balance(TARGET).unwrap(), -3);
    }

    #[test]
    fn block_then_unblock_restores_evaluation() {
        let (engine, _dir) = create_engine();

        let outcome = engine.block(ADMIN, TARGET, "abuse").unwrap();
        assert!(matches!(outcome, BlockOutcome::Blocked(_)));
        assert_eq!(
            engine.evaluate(TARGET, "lookup").unwrap(),
            Decision::deny(DenyReason::Blocked)
        );

        // Redundant block is a reported outcome, not an error.
        assert!(matches!(
            engine.block(ADMIN, TARGET, "again").unwrap(),
            BlockOutcome::AlreadyBlocked
        ));

        let outcome = engine.unblock(ADMIN, TARGET).unwrap();
        assert!(matches!(outcome, UnblockOutcome::Unblocked(_)));
        assert_eq!(engine.evaluate(TARGET, "lookup").unwrap(), Decision::allow(1));

        assert!(matches!(
            engine.unblock(ADMIN, TARGET).unwrap(),
            UnblockOutcome::NotBlocked
        ));
    }

    #[test]
    fn promote_sets_sentinel_and_demote_resets() {
        let (engine, _dir) = create_engine();

        let outcome = engine.promote_special(ADMIN, TARGET, "VIP User").unwrap();
        assert!(matches!(outcome, PromoteOutcome::Promoted(_)));
        assert_eq!(engine.get_balance(TARGET).unwrap(), 999);
        assert_eq!(engine.role_of(TARGET).unwrap(), numbot_core::Role::Special);

        assert!(matches!(
            engine.promote_special(ADMIN, TARGET, "VIP User").unwrap(),
            PromoteOutcome::AlreadySpecial
        ));

        let outcome = engine.demote_special(ADMIN, TARGET).unwrap();
        assert!(matches!(outcome, DemoteOutcome::Demoted(_)));
        assert_eq!(engine.get_balance(TARGET).unwrap(), 5);
        assert_eq!(engine.role_of(TARGET).unwrap(), numbot_core::Role::Normal);

        assert!(matches!(
            engine.demote_special(ADMIN, TARGET).unwrap(),
            DemoteOutcome::NotSpecial
        ));
    }

    #[test]
    fn every_admin_mutation_is_audited() {
        let (engine, _dir) = create_engine();

        engine.grant_credits(ADMIN, TARGET, 10).unwrap();
        engine.revoke_credits(ADMIN, TARGET, 3).unwrap();
        engine.block(ADMIN, TARGET, "abuse").unwrap();
        engine.block(ADMIN, TARGET, "again").unwrap(); // rejected, still audited
        engine.unblock(ADMIN, TARGET).unwrap();

        let log = engine.audit_log(ADMIN, 10, 0).unwrap();
        assert_eq!(log.len(), 5);
        // Newest first.
        assert_eq!(log[0].outcome, "applied");
        assert!(matches!(log[0].action, AdminAction::Unblock));
        assert_eq!(log[1].outcome, "already_blocked");
    }

    #[test]
    fn list_users_sees_lazily_created_targets() {
        let (engine, _dir) = create_engine();

        engine.grant_credits(ADMIN, TARGET, 1).unwrap();
        engine.grant_credits(ADMIN, UserId::new(556), 1).unwrap();

        let users = engine.list_users(ADMIN).unwrap();
        assert_eq!(users.len(), 2);
    }
}
