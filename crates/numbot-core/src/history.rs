//! Query history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HistoryId, UserId};

/// An append-only record of a completed lookup.
///
/// Written by feature handlers after a successful lookup; read by admin
/// tooling. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique record id (ULID for time-ordering).
    pub id: HistoryId,

    /// The caller who made the query.
    pub user_id: UserId,

    /// The query text as the caller sent it.
    pub query: String,

    /// Feature tag the query was routed to.
    pub feature: String,

    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Create a new history record.
    #[must_use]
    pub fn new(user_id: UserId, query: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            id: HistoryId::generate(),
            user_id,
            query: query.into(),
            feature: feature.into(),
            recorded_at: Utc::now(),
        }
    }
}
