//! Error types for Zephyr.

use thiserror::Error;

/// Common error type for Zephyr.
#[derive(Error, Debug)]
pub enum ZephyrError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error (for example a profile without a storage path).
    #[error("configuration error: {0}")]
    Config(String),

    /// A client-supplied relative path escapes the storage root or is malformed.
    #[error("invalid file path: {0}")]
    InvalidPath(String),

    /// An upload would push the profile past its quota.
    #[error("upload would exceed storage quota ({used} used + {incoming} incoming > {limit} bytes)")]
    QuotaExceeded {
        /// Bytes currently on disk.
        used: u64,
        /// Bytes in the rejected batch.
        incoming: u64,
        /// Quota limit in bytes.
        limit: u64,
    },
}

impl From<sqlx::Error> for ZephyrError {
    fn from(e: sqlx::Error) -> Self {
        ZephyrError::Database(e.to_string())
    }
}

/// Result type alias for Zephyr operations.
pub type Result<T> = std::result::Result<T, ZephyrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = ZephyrError::Auth("invalid password".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid password");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = ZephyrError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_config_error_display() {
        let err = ZephyrError::Config("storage path is not configured".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: storage path is not configured"
        );
    }

    #[test]
    fn test_invalid_path_display() {
        let err = ZephyrError::InvalidPath("../etc/passwd".to_string());
        assert_eq!(err.to_string(), "invalid file path: ../etc/passwd");
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = ZephyrError::QuotaExceeded {
            used: 9,
            incoming: 2,
            limit: 10,
        };
        assert!(err.to_string().contains("9 used + 2 incoming > 10 bytes"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ZephyrError = io_err.into();
        assert!(matches!(err, ZephyrError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: ZephyrError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ZephyrError::Database(_)));
    }
}
