//! Charge records: the debit half of a paid operation.
//!
//! A charge is opened (balance debited) before the external lookup runs and
//! settled exactly once afterwards: committed if the lookup produced a
//! usable result, refunded otherwise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChargeId, UserId};

/// A single debit awaiting (or past) settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRecord {
    /// Unique charge id (ULID for time-ordering).
    pub id: ChargeId,

    /// The caller whose balance was debited.
    pub user_id: UserId,

    /// Feature tag the charge was opened for.
    pub feature: String,

    /// Credits debited when the charge was opened.
    pub credits: i64,

    /// Current settlement state.
    pub state: ChargeState,

    /// When the charge was opened.
    pub created_at: DateTime<Utc>,

    /// When the charge was committed or refunded, if settled.
    pub settled_at: Option<DateTime<Utc>>,
}

impl ChargeRecord {
    /// Open a new pending charge.
    #[must_use]
    pub fn open(user_id: UserId, feature: impl Into<String>, credits: i64) -> Self {
        Self {
            id: ChargeId::generate(),
            user_id,
            feature: feature.into(),
            credits,
            state: ChargeState::Pending,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Whether the charge is still awaiting settlement.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, ChargeState::Pending)
    }
}

/// Settlement state of a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeState {
    /// Debited, external operation outcome not yet reported.
    Pending,

    /// The operation produced a usable result; the charge is final.
    Committed,

    /// The operation produced nothing; the debit was returned.
    Refunded,
}
