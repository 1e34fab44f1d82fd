//! FileSystem port - abstraction over snapshot file operations
//!
//! Stages build complete filesystem snapshots. This trait keeps the
//! copying, hashing and probing behind a boundary so use cases and domain
//! services can run against a fake in tests.

use std::path::{Path, PathBuf};

use crate::domain::value_objects::ContentHash;

/// Result type for file system operations
pub type FsResult<T> = Result<T, FsError>;

/// File system operation errors
#[derive(Debug)]
pub enum FsError {
    /// File not found
    NotFound(PathBuf),
    /// Permission denied
    PermissionDenied(PathBuf),
    /// I/O error
    Io(std::io::Error),
    /// Other error
    Other(String),
}

impl FsError {
    /// Wrap an I/O error, remembering which path it concerned.
    pub fn at(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.to_path_buf()),
            _ => FsError::Other(format!("{}: {}", path.display(), err)),
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(PathBuf::new()),
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied(PathBuf::new()),
            _ => FsError::Io(err),
        }
    }
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FsError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            FsError::PermissionDenied(path) => {
                write!(f, "Permission denied: {}", path.display())
            }
            FsError::Io(err) => write!(f, "I/O error: {}", err),
            FsError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FsError {}

/// Filter for tree walks: `(path relative to the walk root, is_dir) -> skip?`
pub type SkipFn<'a> = &'a dyn Fn(&Path, bool) -> bool;

/// Skip nothing.
pub fn skip_none(_: &Path, _: bool) -> bool {
    false
}

/// Abstract file system interface
///
/// Implementations:
/// - `LocalFs` - standard file I/O
/// - test fakes in `application` tests
pub trait FileSystem {
    /// Read file content as string
    fn read(&self, path: &Path) -> FsResult<String>;

    /// Write content to file atomically, creating parents
    fn write(&self, path: &Path, content: &str) -> FsResult<()>;

    /// Check if a path exists (without following a final symlink)
    fn exists(&self, path: &Path) -> bool;

    /// Regular file (after following symlinks) with an execute bit set
    fn is_executable_file(&self, path: &Path) -> bool;

    /// Create directory and parents
    fn create_dir_all(&self, path: &Path) -> FsResult<()>;

    /// Copy a file or directory tree to `to`, preserving permissions and
    /// symlinks. Returns the number of entries copied.
    fn copy_tree(&self, from: &Path, to: &Path, skip: SkipFn<'_>) -> FsResult<u64>;

    /// Content digest of a file or directory tree: relative paths, contents,
    /// executable bits and symlink targets. Timestamps are ignored.
    fn tree_digest(&self, root: &Path, skip: SkipFn<'_>) -> FsResult<ContentHash>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_display() {
        let err = FsError::NotFound(PathBuf::from("test.txt"));
        assert!(err.to_string().contains("test.txt"));
    }

    #[test]
    fn fs_error_at_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let fs_err = FsError::at(Path::new("bot_main.py"), io_err);
        assert!(matches!(fs_err, FsError::NotFound(ref p) if p == Path::new("bot_main.py")));
    }

    #[test]
    fn skip_none_skips_nothing() {
        assert!(!skip_none(Path::new("a"), true));
    }
}
