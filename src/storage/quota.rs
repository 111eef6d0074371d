//! Quota accounting.
//!
//! A `None` limit means the profile is unlimited.

use serde::Serialize;

use crate::{Result, ZephyrError};

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Whether `used` bytes already exceed the limit.
pub fn is_over_quota(used: u64, limit: Option<u64>) -> bool {
    match limit {
        Some(limit) => used > limit,
        None => false,
    }
}

/// Check that a batch of `incoming` bytes fits next to `used` bytes.
///
/// # Examples
///
/// ```
/// use zephyr::storage::check_upload;
///
/// const MB: u64 = 1024 * 1024;
/// assert!(check_upload(9 * MB, 2 * MB, Some(10 * MB)).is_err());
/// assert!(check_upload(9 * MB, MB, Some(10 * MB)).is_ok());
/// assert!(check_upload(9 * MB, 2 * MB, None).is_ok());
/// ```
pub fn check_upload(used: u64, incoming: u64, limit: Option<u64>) -> Result<()> {
    match limit {
        Some(limit) if used.saturating_add(incoming) > limit => Err(ZephyrError::QuotaExceeded {
            used,
            incoming,
            limit,
        }),
        _ => Ok(()),
    }
}

/// Usage summary shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaUsage {
    /// Bytes on disk.
    pub used_bytes: u64,
    /// Quota in bytes, `None` when unlimited.
    pub limit_bytes: Option<u64>,
    /// Used space in MiB.
    pub used_mb: f64,
    /// Quota in MiB.
    pub limit_mb: Option<f64>,
    /// Used space formatted in GiB, e.g. `"1.50 GB"`.
    pub used_human: String,
    /// Whether usage is above the quota.
    pub over_quota: bool,
}

impl QuotaUsage {
    /// Build a summary from raw byte counts.
    pub fn new(used_bytes: u64, limit_bytes: Option<u64>) -> Self {
        Self {
            used_bytes,
            limit_bytes,
            used_mb: used_bytes as f64 / MIB,
            limit_mb: limit_bytes.map(|l| l as f64 / MIB),
            used_human: format!("{:.2} GB", used_bytes as f64 / GIB),
            over_quota: is_over_quota(used_bytes, limit_bytes),
        }
    }
}
