//! Zephyr - multi-tenant file storage with per-user quotas
//!
//! Every account gets a private directory tree under a common storage root.
//! Uploads are checked against the account's quota, indexed in SQLite and
//! exposed through a JSON API for browsing, downloading and deleting.
//!
//! ```
//! use zephyr::storage::{check_upload, normalize_relative_path};
//!
//! assert_eq!(normalize_relative_path("photos/./2024/a.jpg").unwrap(), "photos/2024/a.jpg");
//! assert!(normalize_relative_path("../etc/passwd").is_err());
//! assert!(check_upload(900, 200, Some(1000)).is_err());
//! assert!(check_upload(900, 200, None).is_ok());
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod storage;
pub mod web;

pub use auth::{hash_password, validate_password, verify_password, PasswordError};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository, UserUpdate};
pub use error::{Result, ZephyrError};
