//! Filesystem access used by the builder and the synchronizer.
//!
//! - `FileSystem`: metadata query, directory listing and path resolution
//! - `LocalFileSystem`: `std::fs` implementation with content types guessed
//!   from file names

use std::fs;
use std::path::{Path, PathBuf};

use super::error::TreeError;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Other,
}

/// Metadata returned by `FileSystem::query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub kind: FileKind,
    pub display_name: String,
    pub content_type: Option<String>,
    pub is_hidden: bool,
}

impl FileInfo {
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Read-only view of a filesystem.
pub trait FileSystem {
    /// Query the metadata of a single entry.
    fn query(&self, path: &Path) -> Result<FileInfo, TreeError>;

    /// List the immediate children of a directory, in no particular order.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, TreeError>;

    /// The absolute, canonical form of `path`. Fails when `path` does not exist.
    fn resolve(&self, path: &Path) -> Result<PathBuf, TreeError>;
}

/// The local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn query(&self, path: &Path) -> Result<FileInfo, TreeError> {
        let metadata = fs::metadata(path).map_err(|e| TreeError::from_io(path, e))?;

        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let kind = if metadata.is_dir() {
            FileKind::Directory
        } else if metadata.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };

        let content_type = match kind {
            FileKind::File => mime_guess::from_path(path).first_raw().map(str::to_owned),
            _ => None,
        };

        Ok(FileInfo {
            kind,
            is_hidden: display_name.starts_with('.'),
            display_name,
            content_type,
        })
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, TreeError> {
        let entries = fs::read_dir(dir).map_err(|e| TreeError::from_io(dir, e))?;
        let mut children = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => children.push(entry.path()),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                }
            }
        }
        Ok(children)
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, TreeError> {
        fs::canonicalize(path).map_err(|e| TreeError::from_io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_query_file_and_directory() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("photo.JPG");
        let hidden = dir.path().join(".hidden.png");
        fs::write(&image, b"").unwrap();
        fs::write(&hidden, b"").unwrap();

        let local = LocalFileSystem;
        let info = local.query(&image).unwrap();
        assert_eq!(info.kind, FileKind::File);
        assert_eq!(info.display_name, "photo.JPG");
        assert_eq!(info.content_type.as_deref(), Some("image/jpeg"));
        assert!(!info.is_hidden);

        let info = local.query(&hidden).unwrap();
        assert!(info.is_hidden);
        assert_eq!(info.content_type.as_deref(), Some("image/png"));

        let info = local.query(dir.path()).unwrap();
        assert!(info.is_directory());
        assert_eq!(info.content_type, None);
    }

    #[test]
    fn test_query_missing_path() {
        let dir = tempdir().unwrap();
        let err = LocalFileSystem.query(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, TreeError::NotFound { .. }));
    }

    #[test]
    fn test_list_children() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut children = LocalFileSystem.list(dir.path()).unwrap();
        children.sort();
        assert_eq!(children, vec![dir.path().join("a.png"), dir.path().join("sub")]);
    }

    #[test]
    fn test_resolve() {
        let dir = tempdir().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir(base.join("sub")).unwrap();
        fs::write(base.join("a.png"), b"").unwrap();

        let resolved = LocalFileSystem.resolve(&base.join("sub/../a.png")).unwrap();
        assert_eq!(resolved, base.join("a.png"));

        let err = LocalFileSystem.resolve(&base.join("gone.png")).unwrap_err();
        assert!(matches!(err, TreeError::NotFound { .. }));
    }
}
