//! HTTP server for the Chain-of-Custody Ledger.
//!
//! Exposes custody-event submission and timeline queries over HTTP. The
//! caller's identity is asserted by whatever sits in front of the server
//! (see [`ActorProvider`]); CCL itself only enforces custody rules.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use auth::{ActorProvider, HeaderActorProvider};
pub use config::{FacilityEntry, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::{AppState, CclServer, InMemoryParts};
