//! Storage service.
//!
//! Request-scoped operations that keep the file index and the on-disk tree
//! in step:
//! - Upload with a per-batch quota check
//! - Download, delete and folder delete
//! - Browsing and the dashboard view
//! - Client administration (quota changes, removal)

use serde::Serialize;
use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::db::{Database, User, UserRepository};
use crate::{Result, ZephyrError};

use super::browse::{self, FileEntry, FolderListing, FolderSummary};
use super::path::{file_name, normalize_relative_path};
use super::profile::{storage_path_for, Profile, ProfileOwner, ProfileRepository};
use super::quota::{check_upload, QuotaUsage};
use super::record::{FileRecordRepository, NewFileRecord};
use super::tree::StorageTree;
use super::BYTES_PER_GB;

/// One file from an upload request.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied relative path, not yet normalized.
    pub path: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadFile {
    /// Create an upload entry.
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A file skipped during upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedFile {
    /// Path as supplied by the client.
    pub path: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of an upload batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadOutcome {
    /// Files written and indexed.
    pub stored: Vec<FileEntry>,
    /// Files skipped because of an invalid path.
    pub rejected: Vec<RejectedFile>,
}

/// A downloaded file.
#[derive(Debug)]
pub struct Download {
    /// Normalized relative path.
    pub relative_path: String,
    /// Last path segment.
    pub name: String,
    /// File content.
    pub content: Vec<u8>,
}

/// Result of a file or folder delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    /// Index rows removed.
    pub records_removed: u64,
    /// Whether something was removed from disk.
    pub removed_from_disk: bool,
}

/// Dashboard view for a profile.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile_id: i64,
    pub storage_path: String,
    /// Files without a folder.
    pub files: Vec<FileEntry>,
    /// Top-level folders.
    pub folders: Vec<FolderSummary>,
    pub usage: QuotaUsage,
}

/// A client profile with live usage, for administrators.
#[derive(Debug, Clone, Serialize)]
pub struct ClientUsage {
    #[serde(flatten)]
    pub owner: ProfileOwner,
    pub usage: QuotaUsage,
}

/// Storage service bound to a database and a storage configuration.
pub struct StorageService<'a> {
    db: &'a Database,
    config: &'a StorageConfig,
}

impl<'a> StorageService<'a> {
    /// Create a new StorageService.
    pub fn new(db: &'a Database, config: &'a StorageConfig) -> Self {
        Self { db, config }
    }

    /// Storage root for a username under the configured root.
    pub fn storage_path_for(&self, username: &str) -> String {
        storage_path_for(&self.config.root_path, username)
    }

    /// Load the user's profile, creating it on first access.
    pub async fn profile_for(&self, user: &User) -> Result<Profile> {
        ProfileRepository::new(self.db.pool())
            .get_or_create(
                user.id,
                &self.storage_path_for(&user.username),
                self.config.default_quota_bytes,
            )
            .await
    }

    fn tree(profile: &Profile) -> Result<StorageTree> {
        profile.storage_root().map(StorageTree::new).ok_or_else(|| {
            ZephyrError::Config("storage path is not configured for this account".to_string())
        })
    }

    /// Current usage for a profile, measured on disk.
    pub fn usage(&self, profile: &Profile) -> Result<QuotaUsage> {
        let used = match profile.storage_root() {
            Some(root) => StorageTree::new(root).used_bytes()?,
            None => 0,
        };
        Ok(QuotaUsage::new(used, profile.quota_bytes()))
    }

    /// Upload a batch of files.
    ///
    /// The quota is checked once against the total size of the batch before
    /// anything is written. Files with an invalid path or that cannot be
    /// written are skipped and reported; the rest are written and indexed.
    /// An existing file at the same path is overwritten and its record
    /// replaced.
    pub async fn upload(&self, profile: &Profile, files: Vec<UploadFile>) -> Result<UploadOutcome> {
        if files.is_empty() {
            return Err(ZephyrError::Validation("No files were selected.".to_string()));
        }

        let tree = Self::tree(profile)?;
        let incoming: u64 = files.iter().map(|f| f.content.len() as u64).sum();
        let used = tree.used_bytes()?;
        check_upload(used, incoming, profile.quota_bytes())?;

        let repo = FileRecordRepository::new(self.db.pool());
        let mut outcome = UploadOutcome::default();

        for file in files {
            let relative_path = match normalize_relative_path(&file.path) {
                Ok(p) => p,
                Err(e) => {
                    warn!(profile_id = profile.id, path = %file.path, "Skipping upload: {}", e);
                    outcome.rejected.push(RejectedFile {
                        path: file.path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let size = match tree.write(&relative_path, &file.content) {
                Ok(size) => size,
                Err(e) => {
                    warn!(
                        profile_id = profile.id,
                        path = %relative_path,
                        "Skipping upload: {}",
                        e
                    );
                    outcome.rejected.push(RejectedFile {
                        path: file.path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let record = repo
                .create(&NewFileRecord::new(profile.id, relative_path, size))
                .await?;
            outcome.stored.push(FileEntry::from(&record));
        }

        info!(
            profile_id = profile.id,
            stored = outcome.stored.len(),
            rejected = outcome.rejected.len(),
            bytes = incoming,
            "Upload finished"
        );
        Ok(outcome)
    }

    /// Read a file from the profile's tree.
    pub fn download(&self, profile: &Profile, path: &str) -> Result<Download> {
        let tree = Self::tree(profile)?;
        let relative_path = normalize_relative_path(path)?;
        let content = tree.read(&relative_path)?;

        Ok(Download {
            name: file_name(&relative_path).to_string(),
            relative_path,
            content,
        })
    }

    /// Delete a file.
    ///
    /// Index rows whose name or relative path equals the target are removed,
    /// then whatever exists on disk at the path (a directory is removed
    /// recursively).
    pub async fn delete_file(&self, profile: &Profile, path: &str) -> Result<DeleteOutcome> {
        let tree = Self::tree(profile)?;
        let target = normalize_relative_path(path)?;

        let records_removed = FileRecordRepository::new(self.db.pool())
            .delete_by_name_or_path(profile.id, &target)
            .await?;
        let removed_from_disk = tree.remove(&target)?;

        if records_removed == 0 && !removed_from_disk {
            return Err(ZephyrError::NotFound(format!("file {target}")));
        }

        info!(profile_id = profile.id, path = %target, records_removed, "File deleted");
        Ok(DeleteOutcome {
            records_removed,
            removed_from_disk,
        })
    }

    /// Delete a folder: every record under `folder/` and the directory itself.
    pub async fn delete_folder(&self, profile: &Profile, folder: &str) -> Result<DeleteOutcome> {
        let tree = Self::tree(profile)?;
        let folder = normalize_relative_path(folder)?;

        let records_removed = FileRecordRepository::new(self.db.pool())
            .delete_under_folder(profile.id, &folder)
            .await?;
        let removed_from_disk = tree.resolve(&folder).is_dir() && tree.remove(&folder)?;

        if records_removed == 0 && !removed_from_disk {
            return Err(ZephyrError::NotFound(format!("folder {folder}")));
        }

        info!(profile_id = profile.id, folder = %folder, records_removed, "Folder deleted");
        Ok(DeleteOutcome {
            records_removed,
            removed_from_disk,
        })
    }

    /// List one folder level.
    pub async fn browse(&self, profile: &Profile, folder: &str) -> Result<FolderListing> {
        let folder = normalize_relative_path(folder)?;
        let records = FileRecordRepository::new(self.db.pool())
            .list_by_profile(profile.id)
            .await?;
        Ok(browse::browse(&records, &folder))
    }

    /// Build the dashboard for a user.
    ///
    /// A profile with an empty storage path is repaired first, and the
    /// storage root is created if missing.
    pub async fn dashboard(&self, user: &User) -> Result<Dashboard> {
        let mut profile = self.profile_for(user).await?;

        if profile.storage_root().is_none() {
            warn!(user_id = user.id, "Repairing profile without storage path");
            profile = ProfileRepository::new(self.db.pool())
                .repair(
                    profile.id,
                    &self.storage_path_for(&user.username),
                    self.config.default_quota_bytes,
                )
                .await?
                .ok_or_else(|| ZephyrError::NotFound("profile".to_string()))?;
        }

        Self::tree(&profile)?.ensure_root()?;

        let records = FileRecordRepository::new(self.db.pool())
            .list_by_profile(profile.id)
            .await?;
        let listing = browse::dashboard(&records);
        let usage = self.usage(&profile)?;

        Ok(Dashboard {
            profile_id: profile.id,
            storage_path: profile.storage_path,
            files: listing.files,
            folders: listing.subfolders,
            usage,
        })
    }

    /// List every client profile with live usage.
    pub async fn list_clients(&self) -> Result<Vec<ClientUsage>> {
        let owners = ProfileRepository::new(self.db.pool())
            .list_with_owners()
            .await?;

        let mut clients = Vec::with_capacity(owners.len());
        for owner in owners {
            let used = if owner.storage_path.is_empty() {
                0
            } else {
                StorageTree::new(&owner.storage_path).used_bytes()?
            };
            let limit = owner.quota_limit.map(|q| q.max(0) as u64);
            clients.push(ClientUsage {
                owner,
                usage: QuotaUsage::new(used, limit),
            });
        }
        Ok(clients)
    }

    /// Set a client's quota in GiB, or clear it with `None`.
    pub async fn set_quota(&self, user_id: i64, quota_gb: Option<f64>) -> Result<Profile> {
        let quota = match quota_gb {
            Some(gb) if !gb.is_finite() || gb < 0.0 => {
                return Err(ZephyrError::Validation(
                    "quota must be a non-negative number".to_string(),
                ));
            }
            Some(gb) => Some((gb * BYTES_PER_GB as f64) as u64),
            None => None,
        };

        let repo = ProfileRepository::new(self.db.pool());
        let profile = repo
            .get_by_user(user_id)
            .await?
            .ok_or_else(|| ZephyrError::NotFound("client".to_string()))?;
        repo.set_quota(profile.id, quota).await?;

        info!(user_id, quota_bytes = ?quota, "Quota updated");
        repo.get_by_user(user_id)
            .await?
            .ok_or_else(|| ZephyrError::NotFound("client".to_string()))
    }

    /// Remove a client: delete its storage tree, then the account.
    ///
    /// The profile and its file records go with the account.
    pub async fn remove_client(&self, user_id: i64) -> Result<()> {
        let users = UserRepository::new(self.db.pool());
        let user = users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ZephyrError::NotFound("client".to_string()))?;
        if user.is_admin() {
            return Err(ZephyrError::Permission(
                "administrator accounts cannot be removed".to_string(),
            ));
        }

        if let Some(profile) = ProfileRepository::new(self.db.pool())
            .get_by_user(user_id)
            .await?
        {
            if let Some(root) = profile.storage_root() {
                StorageTree::new(root).remove_all()?;
            }
        }

        users.delete(user_id).await?;
        info!(user_id, username = %user.username, "Client removed");
        Ok(())
    }
}
