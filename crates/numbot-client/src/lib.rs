//! Numbot Client SDK.
//!
//! This crate provides a client library for the chat transport and feature
//! handlers to interact with the numbot credit service.
//!
//! # Example
//!
//! ```no_run
//! use numbot_client::NumbotClient;
//!
//! # async fn example() -> Result<(), numbot_client::ClientError> {
//! let client = NumbotClient::new(
//!     "http://numbot-credits.internal:8080",
//!     "your-service-api-key",
//! );
//!
//! // Gate a paid lookup
//! let charge = client.begin_charge(555, "lookup").await?;
//! if charge.allowed {
//!     // ... run the lookup ...
//!     if let Some(charge_id) = charge.charge_id {
//!         client.commit_charge(&charge_id).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, NumbotClient};
pub use error::ClientError;
pub use types::*;
