//! Authentication helpers: password hashing and registration input checks.

pub mod password;
pub mod validation;

pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use validation::{
    is_reserved_username, validate_email, validate_nickname, validate_registration,
    validate_registration_password, validate_username, ValidationError,
};
