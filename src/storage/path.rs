//! Client-supplied relative path handling.

use crate::{Result, ZephyrError};

/// Normalize a client-supplied relative path.
///
/// Backslashes are treated as separators, repeated separators and `.`
/// segments are dropped, and `x/..` pairs are resolved lexically. The path is
/// rejected when it is absolute, contains a NUL byte, is empty after
/// normalization, or would climb above the storage root.
///
/// # Examples
///
/// ```
/// use zephyr::storage::normalize_relative_path;
///
/// assert_eq!(normalize_relative_path("a//b/./c.txt").unwrap(), "a/b/c.txt");
/// assert_eq!(normalize_relative_path("a/x/../b.txt").unwrap(), "a/b.txt");
/// assert!(normalize_relative_path("../etc/passwd").is_err());
/// assert!(normalize_relative_path("/etc/passwd").is_err());
/// ```
pub fn normalize_relative_path(raw: &str) -> Result<String> {
    if raw.contains('\0') {
        return Err(ZephyrError::InvalidPath(raw.replace('\0', "\\0")));
    }

    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(ZephyrError::InvalidPath(raw.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    match segments.first() {
        None => Err(ZephyrError::InvalidPath("empty path".to_string())),
        Some(&"..") => Err(ZephyrError::InvalidPath(raw.to_string())),
        Some(_) => Ok(segments.join("/")),
    }
}

/// Last segment of a normalized relative path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
