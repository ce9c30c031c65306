//! Numbot HTTP API service.
//!
//! This crate exposes the credit engine to the chat-transport and
//! feature-handler collaborators over HTTP:
//!
//! - Charge lifecycle (evaluate-and-charge, commit, refund)
//! - Balances, daily-grant claims, block status
//! - Query history ingestion
//! - The admin surface (grants, revokes, blocks, specials, audit)
//!
//! # Authentication
//!
//! Every route requires the service API key (`X-Api-Key`): the only clients
//! are trusted collaborators deployed alongside the engine. Admin routes
//! additionally carry the acting user's id in `X-Actor-Id`; the engine
//! verifies it against the configured admin id on every call.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers must be async even though the engine is sync

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use notify::WebhookNotifier;
pub use routes::create_router;
pub use state::AppState;
