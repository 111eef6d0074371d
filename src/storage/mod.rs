//! Quota-enforced per-user file storage.
//!
//! Each user owns a [`Profile`] pointing at a directory under the configured
//! storage root. Uploaded files are written into that [`StorageTree`] and
//! indexed as [`FileRecord`]s. Quota checks always measure the tree on disk;
//! the index only drives listings.

mod browse;
mod path;
mod profile;
mod quota;
mod record;
mod service;
mod tree;

pub use browse::{browse, dashboard, FileEntry, FolderListing, FolderSummary};
pub use path::{file_name, normalize_relative_path};
pub use profile::{storage_path_for, Profile, ProfileOwner, ProfileRepository};
pub use quota::{check_upload, is_over_quota, QuotaUsage};
pub use record::{FileKind, FileRecord, FileRecordRepository, NewFileRecord};
pub use service::{
    ClientUsage, Dashboard, DeleteOutcome, Download, RejectedFile, StorageService, UploadFile,
    UploadOutcome,
};
pub use tree::StorageTree;

/// Bytes in one GiB.
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Quota given to new profiles unless configured otherwise (5 GiB).
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * BYTES_PER_GB;
