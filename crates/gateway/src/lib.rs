//! HTTP gateway: routing, request authentication, and startup wiring.
//!
//! Lifecycle:
//! 1. Load config, resolve data directories
//! 2. Open the database, create schema, seed on first run
//! 3. Build the router and serve
//!
//! Domain logic lives in the other crates; handlers here only translate
//! between HTTP and the services, including resolving the bearer token to
//! the acting subject id.

pub mod auth;
pub mod auth_routes;
pub mod channel_routes;
pub mod error;
pub mod file_routes;
pub mod seed;
pub mod server;
pub mod state;
pub mod subject_routes;
