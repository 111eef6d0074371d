//! Folder views derived from the file index.
//!
//! Folders are not stored anywhere. They are computed by grouping records on
//! the path segment that follows the browsed prefix. Nothing here touches
//! the filesystem.

use serde::Serialize;

use super::record::{FileKind, FileRecord};

/// A file as shown in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub id: i64,
    pub name: String,
    pub relative_path: String,
    pub size: i64,
    pub uploaded_at: String,
    pub extension: String,
    pub kind: FileKind,
}

impl From<&FileRecord> for FileEntry {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            relative_path: record.relative_path.clone(),
            size: record.size,
            uploaded_at: record.created_at.clone(),
            extension: record.extension(),
            kind: record.kind(),
        }
    }
}

/// A derived subfolder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderSummary {
    /// Segment name.
    pub name: String,
    /// Path of the folder relative to the profile root.
    pub path: String,
    /// Number of records anywhere beneath the folder.
    pub file_count: usize,
    /// Upload time of the first record seen in the folder.
    pub uploaded_at: String,
}

/// Contents of one folder level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderListing {
    /// Browsed folder, empty for the root.
    pub folder: String,
    /// Files directly inside the folder.
    pub files: Vec<FileEntry>,
    /// Subfolders, in first-seen order.
    pub subfolders: Vec<FolderSummary>,
}

/// List the direct files and subfolders of `folder`.
pub fn browse(records: &[FileRecord], folder: &str) -> FolderListing {
    let prefix = format!("{folder}/");
    group(records, folder, &prefix)
}

/// List standalone files and top-level folders.
pub fn dashboard(records: &[FileRecord]) -> FolderListing {
    group(records, "", "")
}

fn group(records: &[FileRecord], folder: &str, prefix: &str) -> FolderListing {
    let mut files = Vec::new();
    let mut subfolders: Vec<FolderSummary> = Vec::new();

    for record in records {
        let Some(rest) = record.relative_path.strip_prefix(prefix) else {
            continue;
        };

        match rest.split_once('/') {
            None => files.push(FileEntry::from(record)),
            Some((segment, _)) => {
                if let Some(summary) = subfolders.iter_mut().find(|s| s.name == segment) {
                    summary.file_count += 1;
                } else {
                    subfolders.push(FolderSummary {
                        name: segment.to_string(),
                        path: format!("{prefix}{segment}"),
                        file_count: 1,
                        uploaded_at: record.created_at.clone(),
                    });
                }
            }
        }
    }

    FolderListing {
        folder: folder.to_string(),
        files,
        subfolders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| FileRecord {
                id: i as i64 + 1,
                profile_id: 1,
                name: super::super::path::file_name(path).to_string(),
                relative_path: path.to_string(),
                size: 10,
                created_at: format!("2024-01-01 00:00:{i:02}"),
            })
            .collect()
    }

    #[test]
    fn test_browse_splits_files_and_subfolders() {
        let records = records(&["a/x.txt", "a/b/y.txt"]);

        let listing = browse(&records, "a");

        assert_eq!(listing.folder, "a");
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "x.txt");
        assert_eq!(listing.subfolders.len(), 1);
        assert_eq!(listing.subfolders[0].name, "b");
        assert_eq!(listing.subfolders[0].path, "a/b");
        assert_eq!(listing.subfolders[0].file_count, 1);
    }

    #[test]
    fn test_browse_counts_nested_records_and_keeps_first_time() {
        let records = records(&["a/b/1.txt", "a/c/2.txt", "a/b/d/3.txt", "a/b/4.txt"]);

        let listing = browse(&records, "a");

        assert!(listing.files.is_empty());
        let names: Vec<&str> = listing.subfolders.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(listing.subfolders[0].file_count, 3);
        assert_eq!(listing.subfolders[0].uploaded_at, "2024-01-01 00:00:00");
    }

    #[test]
    fn test_browse_ignores_sibling_prefixes() {
        let records = records(&["ab/x.txt", "a.txt", "b/a/y.txt"]);

        let listing = browse(&records, "a");

        assert!(listing.files.is_empty());
        assert!(listing.subfolders.is_empty());
    }

    #[test]
    fn test_browse_nested_folder() {
        let records = records(&["a/b/y.txt", "a/b/c/z.txt"]);

        let listing = browse(&records, "a/b");

        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].relative_path, "a/b/y.txt");
        assert_eq!(listing.subfolders[0].path, "a/b/c");
    }

    #[test]
    fn test_dashboard_groups_top_level() {
        let records = records(&["notes.txt", "photos/1.jpg", "photos/2024/2.jpg", "docs/a.pdf"]);

        let listing = dashboard(&records);

        assert_eq!(listing.folder, "");
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].name, "notes.txt");
        assert_eq!(listing.subfolders.len(), 2);
        assert_eq!(listing.subfolders[0].name, "photos");
        assert_eq!(listing.subfolders[0].path, "photos");
        assert_eq!(listing.subfolders[0].file_count, 2);
        assert_eq!(listing.subfolders[1].name, "docs");
    }
}
