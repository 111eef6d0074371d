//! Storage profiles: one per user, holding the storage root and quota.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::db::DbPool;
use crate::Result;

/// A user's storage profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    /// Profile ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Absolute storage root. Empty means the profile needs repair.
    pub storage_path: String,
    /// Quota in bytes, `None` when unlimited.
    pub quota_limit: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
}

impl Profile {
    /// Quota in bytes.
    pub fn quota_bytes(&self) -> Option<u64> {
        self.quota_limit.map(|q| q.max(0) as u64)
    }

    /// Storage root, or `None` when the path is unset.
    pub fn storage_root(&self) -> Option<PathBuf> {
        if self.storage_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.storage_path))
        }
    }
}

/// A profile joined with its owner's account, for client listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProfileOwner {
    /// Profile ID.
    pub profile_id: i64,
    /// Owning user ID.
    pub user_id: i64,
    /// Owner's username.
    pub username: String,
    /// Owner's email address.
    pub email: Option<String>,
    /// Storage root.
    pub storage_path: String,
    /// Quota in bytes.
    pub quota_limit: Option<i64>,
}

/// Derive the storage root for a user: `<root>/<username>`.
pub fn storage_path_for(root: impl AsRef<Path>, username: &str) -> String {
    root.as_ref().join(username).to_string_lossy().into_owned()
}

fn quota_to_db(quota: Option<u64>) -> Option<i64> {
    quota.map(|q| i64::try_from(q).unwrap_or(i64::MAX))
}

/// Repository for profile operations.
pub struct ProfileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Fetch the user's profile, creating it if missing.
    ///
    /// Runs as a single upsert keyed by `user_id`, so concurrent first
    /// accesses converge on one row. An existing profile is returned as is,
    /// even if its storage path is empty (see [`ProfileRepository::repair`]).
    pub async fn get_or_create(
        &self,
        user_id: i64,
        storage_path: &str,
        quota: Option<u64>,
    ) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (user_id, storage_path, quota_limit)
             VALUES ($1, $2, $3)
             ON CONFLICT(user_id) DO UPDATE SET user_id = excluded.user_id
             RETURNING id, user_id, storage_path, quota_limit, created_at",
        )
        .bind(user_id)
        .bind(storage_path)
        .bind(quota_to_db(quota))
        .fetch_one(self.pool)
        .await?;

        Ok(profile)
    }

    /// Get a profile by owner.
    pub async fn get_by_user(&self, user_id: i64) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, storage_path, quota_limit, created_at
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// Set or clear a profile's quota. Returns false if the profile is missing.
    pub async fn set_quota(&self, profile_id: i64, quota: Option<u64>) -> Result<bool> {
        let result = sqlx::query("UPDATE profiles SET quota_limit = $1 WHERE id = $2")
            .bind(quota_to_db(quota))
            .bind(profile_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Re-derive an empty storage path and fill a missing quota.
    ///
    /// Profiles that already have a storage path are returned untouched.
    pub async fn repair(
        &self,
        profile_id: i64,
        storage_path: &str,
        default_quota: Option<u64>,
    ) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET
                 storage_path = CASE WHEN storage_path = '' THEN $1 ELSE storage_path END,
                 quota_limit = CASE WHEN storage_path = '' THEN COALESCE(quota_limit, $2)
                                    ELSE quota_limit END
             WHERE id = $3
             RETURNING id, user_id, storage_path, quota_limit, created_at",
        )
        .bind(storage_path)
        .bind(quota_to_db(default_quota))
        .bind(profile_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// List every profile together with its owner, ordered by username.
    pub async fn list_with_owners(&self) -> Result<Vec<ProfileOwner>> {
        let owners = sqlx::query_as::<_, ProfileOwner>(
            "SELECT p.id AS profile_id, u.id AS user_id, u.username, u.email,
                    p.storage_path, p.quota_limit
             FROM profiles p
             JOIN users u ON u.id = p.user_id
             ORDER BY u.username",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(owners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "hash", "Alice"))
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (db, user_id) = setup().await;
        let repo = ProfileRepository::new(db.pool());

        let first = repo
            .get_or_create(user_id, "/srv/users/alice", Some(100))
            .await
            .unwrap();
        let second = repo
            .get_or_create(user_id, "/other/alice", Some(999))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.storage_path, "/srv/users/alice");
        assert_eq!(second.quota_bytes(), Some(100));
    }

    #[tokio::test]
    async fn test_get_or_create_concurrent_first_access() {
        let temp = tempfile::TempDir::new().unwrap();
        let db = Database::open(temp.path().join("zephyr.db")).await.unwrap();
        let user_id = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "hash", "Alice"))
            .await
            .unwrap()
            .id;

        let repo = ProfileRepository::new(db.pool());
        let (a, b, c, d) = tokio::join!(
            repo.get_or_create(user_id, "/srv/users/alice", Some(100)),
            repo.get_or_create(user_id, "/srv/users/alice", Some(100)),
            repo.get_or_create(user_id, "/srv/users/alice", Some(100)),
            repo.get_or_create(user_id, "/srv/users/alice", Some(100)),
        );
        let ids = [a.unwrap().id, b.unwrap().id, c.unwrap().id, d.unwrap().id];
        assert!(ids.iter().all(|&id| id == ids[0]));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_broken_profile() {
        let (db, user_id) = setup().await;
        sqlx::query("INSERT INTO profiles (user_id, storage_path, quota_limit) VALUES ($1, '', NULL)")
            .bind(user_id)
            .execute(db.pool())
            .await
            .unwrap();

        let repo = ProfileRepository::new(db.pool());
        let profile = repo
            .get_or_create(user_id, "/srv/users/alice", Some(100))
            .await
            .unwrap();

        assert!(profile.storage_root().is_none());
        assert_eq!(profile.quota_limit, None);
    }

    #[tokio::test]
    async fn test_repair_only_touches_empty_path() {
        let (db, user_id) = setup().await;
        sqlx::query("INSERT INTO profiles (user_id, storage_path, quota_limit) VALUES ($1, '', NULL)")
            .bind(user_id)
            .execute(db.pool())
            .await
            .unwrap();
        let repo = ProfileRepository::new(db.pool());
        let broken = repo.get_by_user(user_id).await.unwrap().unwrap();
        assert!(broken.storage_root().is_none());

        let repaired = repo
            .repair(broken.id, "/srv/users/alice", Some(500))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repaired.storage_path, "/srv/users/alice");
        assert_eq!(repaired.quota_bytes(), Some(500));

        repo.set_quota(repaired.id, None).await.unwrap();
        let untouched = repo
            .repair(repaired.id, "/elsewhere", Some(500))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.storage_path, "/srv/users/alice");
        assert_eq!(untouched.quota_bytes(), None);
    }

    #[tokio::test]
    async fn test_profile_cascades_with_user() {
        let (db, user_id) = setup().await;
        let repo = ProfileRepository::new(db.pool());
        repo.get_or_create(user_id, "/srv/users/alice", None)
            .await
            .unwrap();
        assert_eq!(repo.list_with_owners().await.unwrap().len(), 1);

        UserRepository::new(db.pool()).delete(user_id).await.unwrap();

        assert!(repo.get_by_user(user_id).await.unwrap().is_none());
        assert!(repo.list_with_owners().await.unwrap().is_empty());
    }

    #[test]
    fn test_storage_path_for() {
        let path = storage_path_for("/srv/users", "alice");
        assert_eq!(PathBuf::from(path), PathBuf::from("/srv/users/alice"));
    }
}
