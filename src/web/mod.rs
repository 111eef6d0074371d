//! Web API module for Zephyr.
//!
//! REST endpoints for accounts, per-user file storage and client
//! administration, served by axum.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
