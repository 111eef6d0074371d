//! Input validation for account registration.
//!
//! The username doubles as the client's storage directory name, so it is
//! restricted to ASCII alphanumerics and underscores.

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 4;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 16;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum nickname length.
pub const MAX_NICKNAME_LENGTH: usize = 20;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is too short.
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain alphanumeric characters and underscores")]
    UsernameInvalidChars,

    /// Username is reserved.
    #[error("this username is reserved")]
    UsernameReserved,

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,

    /// Password is the same as username.
    #[error("password cannot be the same as username")]
    PasswordSameAsUsername,

    /// Nickname is empty.
    #[error("nickname cannot be empty")]
    NicknameEmpty,

    /// Nickname is too long.
    #[error("nickname must be at most {MAX_NICKNAME_LENGTH} characters")]
    NicknameTooLong,

    /// Nickname contains invalid characters.
    #[error("nickname contains invalid characters")]
    NicknameInvalidChars,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,
}

const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "anonymous",
    "support",
    "static",
    "media",
    "null",
    "undefined",
    "zephyr",
];

/// Check if a username is reserved (case-insensitive).
pub fn is_reserved_username(username: &str) -> bool {
    let lower = username.to_lowercase();
    RESERVED_USERNAMES.iter().any(|&r| r == lower)
}

/// Validate a username.
///
/// Requirements:
/// - Length: 4-16 characters
/// - Characters: ASCII alphanumerics and underscore
/// - Not a reserved username
///
/// # Examples
///
/// ```
/// use zephyr::auth::validation::validate_username;
///
/// assert!(validate_username("john_doe").is_ok());
/// assert!(validate_username("ab").is_err());
/// assert!(validate_username("admin").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    if is_reserved_username(username) {
        return Err(ValidationError::UsernameReserved);
    }
    Ok(())
}

/// Validate a registration password, optionally against the username.
pub fn validate_registration_password(
    password: &str,
    username: Option<&str>,
) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    if let Some(user) = username {
        if password.eq_ignore_ascii_case(user) {
            return Err(ValidationError::PasswordSameAsUsername);
        }
    }
    Ok(())
}

/// Validate a nickname: non-empty, at most 20 characters, no control characters.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    if nickname.is_empty() {
        return Err(ValidationError::NicknameEmpty);
    }
    if nickname.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(ValidationError::NicknameTooLong);
    }
    if nickname.chars().any(|c| c.is_control()) {
        return Err(ValidationError::NicknameInvalidChars);
    }
    Ok(())
}

/// Validate an optional email address.
///
/// Empty input is accepted. Otherwise a basic `local@domain.tld` shape is required.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Ok(());
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::EmailInvalidFormat)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if domain.split('.').any(str::is_empty) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate all registration fields, returning the first error.
pub fn validate_registration(
    username: &str,
    password: &str,
    nickname: &str,
    email: Option<&str>,
) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_registration_password(password, Some(username))?;
    validate_nickname(nickname)?;
    if let Some(e) = email {
        validate_email(e)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("john").is_ok());
        assert!(validate_username("john_doe").is_ok());
        assert!(validate_username("JohnDoe123").is_ok());
        assert!(validate_username("abcdefghijklmnop").is_ok());
    }

    #[test]
    fn test_validate_username_length() {
        assert_eq!(
            validate_username("abc"),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            validate_username(&"a".repeat(17)),
            Err(ValidationError::UsernameTooLong)
        );
    }

    #[test]
    fn test_validate_username_rejects_path_characters() {
        for name in ["john-doe", "john.doe", "../etc", "a/b/c/d", "a\\b\\c", "john doe"] {
            assert_eq!(
                validate_username(name),
                Err(ValidationError::UsernameInvalidChars),
                "{name}"
            );
        }
    }

    #[test]
    fn test_validate_username_reserved() {
        assert_eq!(
            validate_username("ADMIN"),
            Err(ValidationError::UsernameReserved)
        );
        assert_eq!(
            validate_username("zephyr"),
            Err(ValidationError::UsernameReserved)
        );
        assert!(!is_reserved_username("adminuser"));
    }

    #[test]
    fn test_validate_registration_password() {
        assert!(validate_registration_password("password123", None).is_ok());
        assert_eq!(
            validate_registration_password("1234567", None),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_registration_password("John_Doe", Some("john_doe")),
            Err(ValidationError::PasswordSameAsUsername)
        );
    }

    #[test]
    fn test_validate_nickname() {
        assert!(validate_nickname("John Doe").is_ok());
        assert!(validate_nickname(&"あ".repeat(20)).is_ok());
        assert_eq!(validate_nickname(""), Err(ValidationError::NicknameEmpty));
        assert_eq!(
            validate_nickname(&"a".repeat(21)),
            Err(ValidationError::NicknameTooLong)
        );
        assert_eq!(
            validate_nickname("John\nDoe"),
            Err(ValidationError::NicknameInvalidChars)
        );
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("").is_ok());
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user.name@example.co.jp").is_ok());

        for bad in [
            "invalid",
            "@example.com",
            "user@",
            "user@example",
            "user@@example.com",
            "user @example.com",
            "user@example..com",
        ] {
            assert_eq!(
                validate_email(bad),
                Err(ValidationError::EmailInvalidFormat),
                "{bad}"
            );
        }

        let long_email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            validate_email(&long_email),
            Err(ValidationError::EmailTooLong)
        );
    }

    #[test]
    fn test_validate_registration_fails_on_first_error() {
        assert!(validate_registration("john_doe", "password123", "John", None).is_ok());
        assert_eq!(
            validate_registration("ab", "short", "", None),
            Err(ValidationError::UsernameTooShort)
        );
    }
}
