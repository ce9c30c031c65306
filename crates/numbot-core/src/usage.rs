//! Per-feature daily usage counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A daily invocation counter for one (user, feature, day) triple.
///
/// Absence of a row is equivalent to a count of zero; old rows may be pruned
/// offline without changing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureUsage {
    /// The caller being counted.
    pub user_id: UserId,

    /// Feature tag, e.g. `"views"`.
    pub feature: String,

    /// The calendar day this counter belongs to.
    pub day: NaiveDate,

    /// Invocations so far today. Never exceeds the feature's cap.
    pub count: u32,
}

/// Format a calendar day as the fixed-width key segment `"YYYY-MM-DD"`.
///
/// Every store key and counter row uses this one formatting so the daily
/// grant and the feature caps can never disagree about day boundaries.
#[must_use]
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
