//! Request handlers.

pub mod admin;
pub mod charges;
pub mod credits;
pub mod history;
