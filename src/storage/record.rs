//! File index: one row per uploaded file.

use serde::Serialize;

use crate::db::DbPool;
use crate::Result;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "ogg", "avi", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac"];

/// Coarse file category derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Pdf,
    Other,
}

/// An indexed file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Record ID.
    pub id: i64,
    /// Owning profile.
    pub profile_id: i64,
    /// Display name (last path segment).
    pub name: String,
    /// Normalized path relative to the profile root.
    pub relative_path: String,
    /// Size in bytes at upload time.
    pub size: i64,
    /// Upload timestamp.
    pub created_at: String,
}

impl FileRecord {
    /// Lower-cased extension of the display name, empty if none.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
            _ => String::new(),
        }
    }

    /// Category by extension. `ogg` counts as video, matching the video list first.
    pub fn kind(&self) -> FileKind {
        let ext = self.extension();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            FileKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            FileKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            FileKind::Audio
        } else if ext == "pdf" {
            FileKind::Pdf
        } else {
            FileKind::Other
        }
    }

    /// Top-level folder, if the file is nested.
    pub fn folder_name(&self) -> Option<&str> {
        self.relative_path
            .split_once('/')
            .map(|(folder, _)| folder)
    }
}

/// Data for indexing a new upload.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Owning profile.
    pub profile_id: i64,
    /// Display name.
    pub name: String,
    /// Normalized relative path.
    pub relative_path: String,
    /// Size in bytes.
    pub size: u64,
}

impl NewFileRecord {
    /// Create a record for `relative_path`; the name is its last segment.
    pub fn new(profile_id: i64, relative_path: impl Into<String>, size: u64) -> Self {
        let relative_path = relative_path.into();
        let name = super::path::file_name(&relative_path).to_string();
        Self {
            profile_id,
            name,
            relative_path,
            size,
        }
    }
}

/// Repository for file index operations.
pub struct FileRecordRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRecordRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Index an upload, replacing any record at the same relative path.
    pub async fn create(&self, record: &NewFileRecord) -> Result<FileRecord> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM files WHERE profile_id = $1 AND relative_path = $2")
            .bind(record.profile_id)
            .bind(&record.relative_path)
            .execute(&mut *tx)
            .await?;

        let created = sqlx::query_as::<_, FileRecord>(
            "INSERT INTO files (profile_id, name, relative_path, size)
             VALUES ($1, $2, $3, $4)
             RETURNING id, profile_id, name, relative_path, size, created_at",
        )
        .bind(record.profile_id)
        .bind(&record.name)
        .bind(&record.relative_path)
        .bind(i64::try_from(record.size).unwrap_or(i64::MAX))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// List a profile's records in upload order.
    pub async fn list_by_profile(&self, profile_id: i64) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(
            "SELECT id, profile_id, name, relative_path, size, created_at
             FROM files WHERE profile_id = $1
             ORDER BY created_at, id",
        )
        .bind(profile_id)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Delete records whose name or relative path equals `target`.
    pub async fn delete_by_name_or_path(&self, profile_id: i64, target: &str) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM files WHERE profile_id = $1 AND (name = $2 OR relative_path = $2)",
        )
        .bind(profile_id)
        .bind(target)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete every record under `folder/`.
    pub async fn delete_under_folder(&self, profile_id: i64, folder: &str) -> Result<u64> {
        let prefix = format!("{folder}/");
        let result = sqlx::query(
            "DELETE FROM files
             WHERE profile_id = $1 AND substr(relative_path, 1, length($2)) = $2",
        )
        .bind(profile_id)
        .bind(&prefix)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Number of records for a profile.
    pub async fn count_by_profile(&self, profile_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE profile_id = $1")
            .bind(profile_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::storage::ProfileRepository;
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "hash", "Alice"))
            .await
            .unwrap();
        let profile = ProfileRepository::new(db.pool())
            .get_or_create(user.id, "/srv/users/alice", None)
            .await
            .unwrap();
        (db, profile.id)
    }

    fn record(name: &str, path: &str) -> FileRecord {
        FileRecord {
            id: 1,
            profile_id: 1,
            name: name.to_string(),
            relative_path: path.to_string(),
            size: 0,
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_derived_properties() {
        let photo = record("Beach.JPG", "trips/Beach.JPG");
        assert_eq!(photo.extension(), "jpg");
        assert_eq!(photo.kind(), FileKind::Image);
        assert_eq!(photo.folder_name(), Some("trips"));

        let notes = record("notes", "notes");
        assert_eq!(notes.extension(), "");
        assert_eq!(notes.kind(), FileKind::Other);
        assert_eq!(notes.folder_name(), None);

        assert_eq!(record("a.ogg", "a.ogg").kind(), FileKind::Video);
        assert_eq!(record("a.flac", "a.flac").kind(), FileKind::Audio);
        assert_eq!(record("a.pdf", "a.pdf").kind(), FileKind::Pdf);
        assert_eq!(record(".bashrc", ".bashrc").extension(), "");
    }

    #[test]
    fn test_new_file_record_name() {
        let new = NewFileRecord::new(1, "a/b/c.txt", 3);
        assert_eq!(new.name, "c.txt");
        assert_eq!(new.relative_path, "a/b/c.txt");
    }

    #[tokio::test]
    async fn test_create_replaces_same_path() {
        let (db, profile_id) = setup().await;
        let repo = FileRecordRepository::new(db.pool());

        repo.create(&NewFileRecord::new(profile_id, "a/x.txt", 10))
            .await
            .unwrap();
        let second = repo
            .create(&NewFileRecord::new(profile_id, "a/x.txt", 20))
            .await
            .unwrap();

        let records = repo.list_by_profile(profile_id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[0].size, 20);
    }

    #[tokio::test]
    async fn test_delete_by_name_or_path() {
        let (db, profile_id) = setup().await;
        let repo = FileRecordRepository::new(db.pool());
        repo.create(&NewFileRecord::new(profile_id, "x.txt", 1))
            .await
            .unwrap();
        repo.create(&NewFileRecord::new(profile_id, "a/x.txt", 1))
            .await
            .unwrap();
        repo.create(&NewFileRecord::new(profile_id, "a/y.txt", 1))
            .await
            .unwrap();

        assert_eq!(repo.delete_by_name_or_path(profile_id, "a/y.txt").await.unwrap(), 1);
        assert_eq!(repo.delete_by_name_or_path(profile_id, "x.txt").await.unwrap(), 2);
        assert_eq!(repo.count_by_profile(profile_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_under_folder_matches_prefix_only() {
        let (db, profile_id) = setup().await;
        let repo = FileRecordRepository::new(db.pool());
        for path in ["a/x.txt", "a/b/y.txt", "ab/z.txt", "a.txt"] {
            repo.create(&NewFileRecord::new(profile_id, path, 1))
                .await
                .unwrap();
        }

        assert_eq!(repo.delete_under_folder(profile_id, "a").await.unwrap(), 2);

        let remaining: Vec<String> = repo
            .list_by_profile(profile_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.relative_path)
            .collect();
        assert_eq!(remaining, vec!["ab/z.txt", "a.txt"]);
    }
}
