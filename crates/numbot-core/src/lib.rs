//! Core types and utilities for the numbot credit engine.
//!
//! This crate provides the foundational types used throughout the numbot
//! accounting platform:
//!
//! - **Identifiers**: `UserId`, `HistoryId`, `ChargeId`, `AuditId`
//! - **Accounts**: `Account`, `Role`, `SpecialUser`
//! - **Blocking**: `BlockRecord`
//! - **Charges**: `ChargeRecord`, `ChargeState`
//! - **Quota**: `FeatureUsage`, `Decision`, `DenyReason`
//! - **History & audit**: `HistoryRecord`, `AuditRecord`, `AdminAction`
//!
//! # Credit Unit
//!
//! **1 credit = 1 paid lookup.**
//!
//! - A new account starts with 5 credits
//! - Every normal account receives +10 credits once per calendar day
//! - A successful paid operation deducts its cost (usually 1)
//! - Stored as `i64` so an admin revoke can drive a balance negative

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod audit;
pub mod block;
pub mod charge;
pub mod decision;
pub mod history;
pub mod ids;
pub mod special;
pub mod usage;

pub use account::{
    Account, Role, DAILY_GRANT_CREDITS, DEFAULT_DAILY_FEATURE_CAP, DEFAULT_LOOKUP_COST,
    DEFAULT_STARTING_CREDITS, SPECIAL_BALANCE_CREDITS,
};
pub use audit::{AdminAction, AuditRecord};
pub use block::BlockRecord;
pub use charge::{ChargeRecord, ChargeState};
pub use decision::{BalanceChange, ClaimOutcome, Decision, DenyReason, GrantOutcome};
pub use history::HistoryRecord;
pub use ids::{AuditId, ChargeId, HistoryId, IdError, UserId};
pub use special::SpecialUser;
pub use usage::{day_key, FeatureUsage};
