//! On-disk directory tree under a profile's storage root.
//!
//! The tree is the source of truth for used space. All paths handed to
//! [`StorageTree`] must already be normalized with
//! [`normalize_relative_path`](super::normalize_relative_path).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Result, ZephyrError};

/// A profile's storage directory.
///
/// ```text
/// {root}/
/// ├── notes.txt
/// └── photos/
///     └── 2024/
///         └── beach.jpg
/// ```
#[derive(Debug, Clone)]
pub struct StorageTree {
    root: PathBuf,
}

impl StorageTree {
    /// Create a tree handle. Nothing is created on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Absolute location of a normalized relative path.
    pub fn resolve(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Sum of the sizes of all regular files under the root.
    ///
    /// A missing root counts as empty.
    pub fn used_bytes(&self) -> Result<u64> {
        if !self.root.exists() {
            return Ok(0);
        }

        let mut total = 0u64;
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                total += entry.metadata().map_err(io::Error::from)?.len();
            }
        }
        Ok(total)
    }

    /// Write a file, creating intermediate directories.
    ///
    /// An existing file at the same path is overwritten. Returns the number
    /// of bytes written.
    pub fn write(&self, relative_path: &str, content: &[u8]) -> Result<u64> {
        let path = self.resolve(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(content.len() as u64)
    }

    /// Read a regular file.
    pub fn read(&self, relative_path: &str) -> Result<Vec<u8>> {
        let path = self.resolve(relative_path);
        if !path.is_file() {
            return Err(ZephyrError::NotFound(format!("file {relative_path}")));
        }
        Ok(fs::read(&path)?)
    }

    /// Remove a file, or a directory recursively.
    ///
    /// Returns `false` if nothing existed at the path.
    pub fn remove(&self, relative_path: &str) -> Result<bool> {
        remove_entry(&self.resolve(relative_path))
    }

    /// Remove the whole tree including its root.
    pub fn remove_all(&self) -> Result<bool> {
        remove_entry(&self.root)
    }
}

fn remove_entry(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}
