//! API handlers.

pub mod admin;
pub mod auth;
pub mod storage;

pub use admin::*;
pub use auth::*;
pub use storage::*;
