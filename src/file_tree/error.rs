use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced when loading a tree from the filesystem.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("No such file or directory: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied: {path}")]
    AccessDenied { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

impl TreeError {
    /// Classify an I/O failure on `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => TreeError::NotFound { path },
            io::ErrorKind::PermissionDenied => TreeError::AccessDenied { path },
            _ => TreeError::Io { path, source },
        }
    }

    /// The path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            TreeError::NotFound { path }
            | TreeError::AccessDenied { path }
            | TreeError::Io { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_classified() {
        let path = Path::new("/missing");
        let err = TreeError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, TreeError::NotFound { .. }));

        let err = TreeError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, TreeError::AccessDenied { .. }));

        let err = TreeError::from_io(path, io::Error::new(io::ErrorKind::Other, "disk on fire"));
        assert!(matches!(err, TreeError::Io { .. }));
        assert_eq!(err.path(), path);
    }
}
