//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Compound mutations take the `rmw` lock for the duration of their
//! read-check-write cycle and flush through a single `WriteBatch`, which is
//! what makes debits, grants, and cap increments atomic under concurrent
//! requests.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use numbot_core::{
    Account, AuditRecord, BalanceChange, BlockRecord, ChargeId, ChargeRecord, ChargeState,
    FeatureUsage, GrantOutcome, HistoryRecord, SpecialUser, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed ledger implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serialises read-modify-write compound operations. Plain point reads
    /// and appends don't take it; every balance/counter/flag mutation does.
    rmw: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            rmw: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read and decode one record from a column family.
    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Write a batch.
    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Load the account or fail with `NotFound`. Callers that mutate must
    /// already hold the `rmw` lock.
    fn require_account(&self, user_id: UserId) -> Result<Account> {
        self.get_record::<Account>(cf::ACCOUNTS, &keys::user_key(user_id))?
            .ok_or(StoreError::NotFound)
    }

    /// Read a usage counter row. Absence is zero.
    fn read_usage(&self, user_id: UserId, feature: &str, day: NaiveDate) -> Result<u32> {
        Ok(self
            .get_record::<FeatureUsage>(cf::USAGE, &keys::usage_key(user_id, feature, day))?
            .map_or(0, |usage| usage.count))
    }

    /// Stage an account write into a batch.
    fn stage_account(&self, batch: &mut WriteBatch, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        batch.put_cf(&cf, keys::user_key(account.user_id), Self::serialize(account)?);
        Ok(())
    }

    /// Stage a usage-counter write into a batch.
    fn stage_usage(&self, batch: &mut WriteBatch, usage: &FeatureUsage) -> Result<()> {
        let cf = self.cf(cf::USAGE)?;
        batch.put_cf(
            &cf,
            keys::usage_key(usage.user_id, &usage.feature, usage.day),
            Self::serialize(usage)?,
        );
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::user_key(account.user_id);
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: UserId) -> Result<Option<Account>> {
        self.get_record(cf::ACCOUNTS, &keys::user_key(user_id))
    }

    fn ensure_account(
        &self,
        user_id: UserId,
        starting_credits: i64,
        day: NaiveDate,
    ) -> Result<Account> {
        let _guard = self.rmw.lock();

        if let Some(account) = self.get_account(user_id)? {
            return Ok(account);
        }

        let mut account = Account::new(user_id, starting_credits);
        // The starting balance is the creation day's credit.
        account.last_grant_date = Some(day);
        self.put_account(&account)?;
        tracing::debug!(user_id = %user_id, credits = starting_credits, "account created");
        Ok(account)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let mut accounts = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            accounts.push(Self::deserialize(&value)?);
        }

        Ok(accounts)
    }

    fn adjust_credits(
        &self,
        user_id: UserId,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<BalanceChange> {
        let _guard = self.rmw.lock();

        let mut account = self.require_account(user_id)?;
        let previous = account.credits;
        let new = previous + delta;

        if let Some(floor) = floor {
            if new < floor {
                return Err(StoreError::InsufficientCredits {
                    balance: previous,
                    required: delta.abs(),
                });
            }
        }

        account.credits = new;
        account.updated_at = chrono::Utc::now();
        self.put_account(&account)?;

        Ok(BalanceChange { previous, new })
    }

    fn apply_daily_grant(
        &self,
        user_id: UserId,
        day: NaiveDate,
        amount: i64,
    ) -> Result<GrantOutcome> {
        let _guard = self.rmw.lock();

        let mut account = self.require_account(user_id)?;

        if account.last_grant_date == Some(day) {
            return Ok(GrantOutcome::AlreadyClaimed { claimed_on: day });
        }

        account.credits += amount;
        account.last_grant_date = Some(day);
        account.updated_at = chrono::Utc::now();
        self.put_account(&account)?;

        Ok(GrantOutcome::Granted {
            new_balance: account.credits,
        })
    }

    // =========================================================================
    // Block Operations
    // =========================================================================

    fn get_block(&self, user_id: UserId) -> Result<Option<BlockRecord>> {
        self.get_record(cf::BLOCKS, &keys::user_key(user_id))
    }

    fn is_blocked(&self, user_id: UserId) -> Result<bool> {
        Ok(self.get_block(user_id)?.is_some())
    }

    fn insert_block(&self, record: &BlockRecord) -> Result<()> {
        let _guard = self.rmw.lock();

        let mut account = self.require_account(record.user_id)?;
        if self.get_block(record.user_id)?.is_some() {
            return Err(StoreError::AlreadyBlocked);
        }

        account.is_blocked = true;
        account.updated_at = chrono::Utc::now();

        let cf_blocks = self.cf(cf::BLOCKS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_blocks,
            keys::user_key(record.user_id),
            Self::serialize(record)?,
        );
        self.stage_account(&mut batch, &account)?;

        self.write(batch)
    }

    fn remove_block(&self, user_id: UserId) -> Result<BlockRecord> {
        let _guard = self.rmw.lock();

        let mut account = self.require_account(user_id)?;
        let record = self.get_block(user_id)?.ok_or(StoreError::NotBlocked)?;

        account.is_blocked = false;
        account.updated_at = chrono::Utc::now();

        let cf_blocks = self.cf(cf::BLOCKS)?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_blocks, keys::user_key(user_id));
        self.stage_account(&mut batch, &account)?;

        self.write(batch)?;
        Ok(record)
    }

    // =========================================================================
    // Special Allow-List Operations
    // =========================================================================

    fn get_special(&self, user_id: UserId) -> Result<Option<SpecialUser>> {
        self.get_record(cf::SPECIALS, &keys::user_key(user_id))
    }

    fn is_special(&self, user_id: UserId) -> Result<bool> {
        Ok(self.get_special(user_id)?.is_some())
    }

    fn list_specials(&self) -> Result<Vec<SpecialUser>> {
        let cf = self.cf(cf::SPECIALS)?;
        let mut specials = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            specials.push(Self::deserialize(&value)?);
        }

        Ok(specials)
    }

    fn insert_special(&self, record: &SpecialUser, promoted_credits: i64) -> Result<()> {
        let _guard = self.rmw.lock();

        let mut account = self.require_account(record.user_id)?;
        if self.get_special(record.user_id)?.is_some() {
            return Err(StoreError::AlreadySpecial);
        }

        account.credits = promoted_credits;
        account.updated_at = chrono::Utc::now();

        let cf_specials = self.cf(cf::SPECIALS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_specials,
            keys::user_key(record.user_id),
            Self::serialize(record)?,
        );
        self.stage_account(&mut batch, &account)?;

        self.write(batch)
    }

    fn remove_special(&self, user_id: UserId, reset_credits: i64) -> Result<SpecialUser> {
        let _guard = self.rmw.lock();

        let mut account = self.require_account(user_id)?;
        let record = self.get_special(user_id)?.ok_or(StoreError::NotSpecial)?;

        account.credits = reset_credits;
        account.updated_at = chrono::Utc::now();

        let cf_specials = self.cf(cf::SPECIALS)?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_specials, keys::user_key(user_id));
        self.stage_account(&mut batch, &account)?;

        self.write(batch)?;
        Ok(record)
    }

    // =========================================================================
    // Usage Counter Operations
    // =========================================================================

    fn usage_count(&self, user_id: UserId, feature: &str, day: NaiveDate) -> Result<u32> {
        self.read_usage(user_id, feature, day)
    }

    fn increment_usage(
        &self,
        user_id: UserId,
        feature: &str,
        day: NaiveDate,
        cap: u32,
    ) -> Result<u32> {
        let _guard = self.rmw.lock();

        let count = self.read_usage(user_id, feature, day)?;
        if count >= cap {
            return Err(StoreError::DailyCapReached {
                feature: feature.to_string(),
                cap,
            });
        }

        let usage = FeatureUsage {
            user_id,
            feature: feature.to_string(),
            day,
            count: count + 1,
        };

        let mut batch = WriteBatch::default();
        self.stage_usage(&mut batch, &usage)?;
        self.write(batch)?;

        Ok(usage.count)
    }

    // =========================================================================
    // Charge Operations
    // =========================================================================

    fn open_charge(&self, charge: &ChargeRecord, cap: Option<(NaiveDate, u32)>) -> Result<i64> {
        let _guard = self.rmw.lock();

        let mut account = self.require_account(charge.user_id)?;

        // Cap check first so a capped-out request never touches the balance.
        let usage = match cap {
            Some((day, cap)) => {
                let count = self.read_usage(charge.user_id, &charge.feature, day)?;
                if count >= cap {
                    return Err(StoreError::DailyCapReached {
                        feature: charge.feature.clone(),
                        cap,
                    });
                }
                Some(FeatureUsage {
                    user_id: charge.user_id,
                    feature: charge.feature.clone(),
                    day,
                    count: count + 1,
                })
            }
            None => None,
        };

        if account.credits < charge.credits {
            return Err(StoreError::InsufficientCredits {
                balance: account.credits,
                required: charge.credits,
            });
        }

        account.credits -= charge.credits;
        account.updated_at = chrono::Utc::now();

        let cf_charges = self.cf(cf::CHARGES)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_charges, keys::charge_key(charge.id), Self::serialize(charge)?);
        self.stage_account(&mut batch, &account)?;
        if let Some(usage) = &usage {
            self.stage_usage(&mut batch, usage)?;
        }

        self.write(batch)?;
        Ok(account.credits)
    }

    fn get_charge(&self, charge_id: ChargeId) -> Result<Option<ChargeRecord>> {
        self.get_record(cf::CHARGES, &keys::charge_key(charge_id))
    }

    fn settle_charge(&self, charge_id: ChargeId, state: ChargeState) -> Result<ChargeRecord> {
        let _guard = self.rmw.lock();

        let mut charge = self.get_charge(charge_id)?.ok_or(StoreError::NotFound)?;
        if !charge.is_pending() {
            return Err(StoreError::ChargeAlreadySettled {
                charge_id: charge_id.to_string(),
            });
        }

        charge.state = state;
        charge.settled_at = Some(chrono::Utc::now());

        let cf_charges = self.cf(cf::CHARGES)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_charges, keys::charge_key(charge_id), Self::serialize(&charge)?);

        if state == ChargeState::Refunded && charge.credits != 0 {
            let mut account = self.require_account(charge.user_id)?;
            account.credits += charge.credits;
            account.updated_at = chrono::Utc::now();
            self.stage_account(&mut batch, &account)?;
        }

        self.write(batch)?;
        Ok(charge)
    }

    // =========================================================================
    // History Operations
    // =========================================================================

    fn append_history(&self, record: &HistoryRecord) -> Result<()> {
        let cf = self.cf(cf::HISTORY)?;
        let key = keys::history_key(record.user_id, record.id);
        let value = Self::serialize(record)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_history(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoryRecord>> {
        let cf = self.cf(cf::HISTORY)?;
        let prefix = keys::history_prefix(user_id);

        // Collect the user's rows in key order; ULIDs make that
        // chronological, so reversing gives newest first.
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut rows: Vec<HistoryRecord> = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            rows.push(Self::deserialize(&value)?);
        }

        rows.reverse();
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    // =========================================================================
    // Audit Operations
    // =========================================================================

    fn append_audit(&self, record: &AuditRecord) -> Result<()> {
        let cf = self.cf(cf::AUDIT)?;
        let key = keys::audit_key(record.id);
        let value = Self::serialize(record)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_audit(&self, limit: usize, offset: usize) -> Result<Vec<AuditRecord>> {
        let cf = self.cf(cf::AUDIT)?;

        let mut rows: Vec<AuditRecord> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            rows.push(Self::deserialize(&value)?);
        }

        rows.reverse();
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}
