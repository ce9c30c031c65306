//! `RocksDB` ledger storage for the numbot credit engine.
//!
//! This crate provides persistent storage for accounts, blocks, the special
//! allow-list, daily usage counters, charges, query history, and the admin
//! audit log, using `RocksDB` with column families per logical table.
//!
//! # Architecture
//!
//! Column families:
//!
//! - `accounts`: account records, keyed by user id
//! - `blocks`: active block records, keyed by user id
//! - `specials`: durable special-user allow-list, keyed by user id
//! - `usage`: daily feature counters, keyed by `user || day || feature`
//! - `charges`: charge records, keyed by charge id (ULID)
//! - `history`: query history, keyed by `user || history id`
//! - `audit`: admin audit log, keyed by audit id (ULID)
//!
//! Every compound mutation (debit, grant, cap increment, block/unblock,
//! promote/demote, settle) is a read-modify-write executed under a single
//! process-wide lock and flushed as one `WriteBatch`, so two concurrent
//! charges can never both spend the last credit.
//!
//! # Example
//!
//! ```no_run
//! use numbot_store::{RocksStore, Store};
//! use numbot_core::UserId;
//!
//! let store = RocksStore::open("/tmp/numbot-db").unwrap();
//!
//! // Lazily create an account on first contact
//! let today = chrono::Utc::now().date_naive();
//! let account = store.ensure_account(UserId::new(555), 5, today).unwrap();
//! assert_eq!(account.credits, 5);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::NaiveDate;
use numbot_core::{
    Account, AuditRecord, BalanceChange, BlockRecord, ChargeId, ChargeRecord, ChargeState,
    GrantOutcome, HistoryRecord, SpecialUser, UserId,
};

/// The storage trait defining all ledger operations.
///
/// This trait abstracts the storage layer, allowing different
/// implementations (e.g. `RocksDB`, in-memory for testing). Every mutating
/// operation is atomic with respect to its own read of the prior value.
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: UserId) -> Result<Option<Account>>;

    /// Get an account, creating it with `starting_credits` if absent.
    ///
    /// The creation day is recorded as the last grant date: the starting
    /// balance counts as the first day's credit, so a brand-new account is
    /// not immediately topped up again by the daily grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn ensure_account(&self, user_id: UserId, starting_credits: i64, day: NaiveDate)
        -> Result<Account>;

    /// List every account, ordered by user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Adjust an account's balance by `delta`, atomically.
    ///
    /// When `floor` is set, the adjustment is rejected with
    /// `StoreError::InsufficientCredits` if it would take the balance below
    /// the floor; with `floor = None` the balance may go negative (the
    /// admin-revoke path).
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the floor would be crossed.
    fn adjust_credits(
        &self,
        user_id: UserId,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<BalanceChange>;

    /// Apply the daily grant for `day`, at most once per calendar day.
    ///
    /// The second call with the same day is a no-op reporting
    /// `GrantOutcome::AlreadyClaimed` with the last claim date.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn apply_daily_grant(&self, user_id: UserId, day: NaiveDate, amount: i64)
        -> Result<GrantOutcome>;

    // =========================================================================
    // Block Operations
    // =========================================================================

    /// Get the active block record for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_block(&self, user_id: UserId) -> Result<Option<BlockRecord>>;

    /// Check whether a user has an active block.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn is_blocked(&self, user_id: UserId) -> Result<bool>;

    /// Insert a block record and set the account's blocked flag, atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::AlreadyBlocked` if a block record already exists.
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn insert_block(&self, record: &BlockRecord) -> Result<()>;

    /// Remove the block record and clear the blocked flag, atomically.
    ///
    /// Returns the removed record.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotBlocked` if no block record exists.
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn remove_block(&self, user_id: UserId) -> Result<BlockRecord>;

    // =========================================================================
    // Special Allow-List Operations
    // =========================================================================

    /// Get a user's allow-list record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_special(&self, user_id: UserId) -> Result<Option<SpecialUser>>;

    /// Check whether a user is on the allow-list.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn is_special(&self, user_id: UserId) -> Result<bool>;

    /// List the full allow-list, ordered by user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_specials(&self) -> Result<Vec<SpecialUser>>;

    /// Add a user to the allow-list and set the promoted balance, atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::AlreadySpecial` if the user is already listed.
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn insert_special(&self, record: &SpecialUser, promoted_credits: i64) -> Result<()>;

    /// Remove a user from the allow-list and reset the balance, atomically.
    ///
    /// Returns the removed record.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotSpecial` if the user is not listed.
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn remove_special(&self, user_id: UserId, reset_credits: i64) -> Result<SpecialUser>;

    // =========================================================================
    // Usage Counter Operations
    // =========================================================================

    /// Read a daily usage counter. Absence is zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn usage_count(&self, user_id: UserId, feature: &str, day: NaiveDate) -> Result<u32>;

    /// Increment a daily usage counter, rejecting at the cap.
    ///
    /// The cap check and the increment happen under one lock, so the
    /// counter can never exceed `cap` as observed by any caller. Returns
    /// the new count.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DailyCapReached` if the counter is at the cap;
    /// the counter is untouched in that case.
    fn increment_usage(
        &self,
        user_id: UserId,
        feature: &str,
        day: NaiveDate,
        cap: u32,
    ) -> Result<u32>;

    // =========================================================================
    // Charge Operations
    // =========================================================================

    /// Open a charge: debit the balance and write the pending record as one
    /// atomic unit.
    ///
    /// When `cap` is given, the feature's daily counter is cap-checked and
    /// incremented in the same unit, so a denied request leaves no partial
    /// state. Returns the balance after the debit.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the balance can't cover it.
    /// - `StoreError::DailyCapReached` if the counter is at the cap.
    fn open_charge(&self, charge: &ChargeRecord, cap: Option<(NaiveDate, u32)>) -> Result<i64>;

    /// Get a charge by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_charge(&self, charge_id: ChargeId) -> Result<Option<ChargeRecord>>;

    /// Settle a pending charge exactly once.
    ///
    /// Settling as `ChargeState::Refunded` returns the debited credits to
    /// the account in the same atomic unit. Returns the settled record.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the charge doesn't exist.
    /// - `StoreError::ChargeAlreadySettled` if it was already settled.
    fn settle_charge(&self, charge_id: ChargeId, state: ChargeState) -> Result<ChargeRecord>;

    // =========================================================================
    // History Operations
    // =========================================================================

    /// Append a history record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn append_history(&self, record: &HistoryRecord) -> Result<()>;

    /// List history for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_history(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRecord>>;

    // =========================================================================
    // Audit Operations
    // =========================================================================

    /// Append an admin audit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn append_audit(&self, record: &AuditRecord) -> Result<()>;

    /// List audit records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_audit(&self, limit: usize, offset: usize) -> Result<Vec<AuditRecord>>;
}
