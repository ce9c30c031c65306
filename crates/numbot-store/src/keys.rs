//! Key encoding utilities for the ledger column families.
//!
//! User-scoped keys start with the big-endian 8-byte user id so all rows for
//! a user are contiguous; record ids append a ULID so range scans come back
//! in chronological order.

use chrono::NaiveDate;

use numbot_core::{day_key, HistoryId, UserId};

/// Create an account/block/special key from a user id.
#[must_use]
pub fn user_key(user_id: UserId) -> Vec<u8> {
    user_id.to_be_bytes().to_vec()
}

/// Create a usage-counter key.
///
/// Format: `user_id (8 bytes) || day ("YYYY-MM-DD", 10 bytes) || feature`
#[must_use]
pub fn usage_key(user_id: UserId, feature: &str, day: NaiveDate) -> Vec<u8> {
    let day = day_key(day);
    let mut key = Vec::with_capacity(8 + day.len() + feature.len());
    key.extend_from_slice(&user_id.to_be_bytes());
    key.extend_from_slice(day.as_bytes());
    key.extend_from_slice(feature.as_bytes());
    key
}

/// Create a history key.
///
/// Format: `user_id (8 bytes) || history_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a user's history iterates oldest first.
#[must_use]
pub fn history_key(user_id: UserId, history_id: HistoryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&user_id.to_be_bytes());
    key.extend_from_slice(&history_id.to_bytes());
    key
}

/// Create a prefix for iterating all history rows for a user.
#[must_use]
pub fn history_prefix(user_id: UserId) -> Vec<u8> {
    user_id.to_be_bytes().to_vec()
}

/// Create a charge key from a charge id.
#[must_use]
pub fn charge_key(charge_id: numbot_core::ChargeId) -> Vec<u8> {
    charge_id.to_bytes().to_vec()
}

/// Create an audit key from an audit id.
#[must_use]
pub fn audit_key(audit_id: numbot_core::AuditId) -> Vec<u8> {
    audit_id.to_bytes().to_vec()
}
