//! Local File System Implementation
//!
//! Implements the FileSystem port for local disk operations.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::ports::{FileSystem, FsError, FsResult, SkipFn};
use crate::domain::value_objects::ContentHash;

/// Local file system implementation
///
/// Provides atomic writes, tree copies and tree digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new LocalFs instance
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn read(&self, path: &Path) -> FsResult<String> {
        fs::read_to_string(path).map_err(|e| FsError::at(path, e))
    }

    fn write(&self, path: &Path, content: &str) -> FsResult<()> {
        atomic_write(path, content.as_bytes())
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_executable_file(&self, path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(meta) => meta.is_file() && is_executable(&meta),
            Err(_) => false,
        }
    }

    fn create_dir_all(&self, path: &Path) -> FsResult<()> {
        fs::create_dir_all(path).map_err(|e| FsError::at(path, e))
    }

    fn copy_tree(&self, from: &Path, to: &Path, skip: SkipFn<'_>) -> FsResult<u64> {
        let mut copied = 0u64;
        let mut dirs: Vec<(PathBuf, fs::Permissions)> = Vec::new();

        walk(from, skip, &mut |rel, meta| {
            let src = join_rel(from, rel);
            let dst = join_rel(to, rel);
            let kind = meta.file_type();

            if kind.is_dir() {
                fs::create_dir_all(&dst).map_err(|e| FsError::at(&dst, e))?;
                dirs.push((dst, meta.permissions()));
            } else {
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent).map_err(|e| FsError::at(parent, e))?;
                }
                if fs::symlink_metadata(&dst).is_ok() {
                    fs::remove_file(&dst).map_err(|e| FsError::at(&dst, e))?;
                }
                if kind.is_symlink() {
                    let target = fs::read_link(&src).map_err(|e| FsError::at(&src, e))?;
                    make_symlink(&target, &dst)?;
                } else {
                    fs::copy(&src, &dst).map_err(|e| FsError::at(&src, e))?;
                }
            }
            copied += 1;
            Ok(())
        })?;

        // Permissions last, so read-only directories can still be filled
        for (dir, perms) in dirs.into_iter().rev() {
            fs::set_permissions(&dir, perms).map_err(|e| FsError::at(&dir, e))?;
        }
        Ok(copied)
    }

    fn tree_digest(&self, root: &Path, skip: SkipFn<'_>) -> FsResult<ContentHash> {
        let mut parts: Vec<Vec<u8>> = Vec::new();

        walk(root, skip, &mut |rel, meta| {
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            let kind = meta.file_type();
            let record = if kind.is_dir() {
                format!("d {}", rel_str)
            } else if kind.is_symlink() {
                let path = join_rel(root, rel);
                let target = fs::read_link(&path).map_err(|e| FsError::at(&path, e))?;
                format!("l {} {}", rel_str, target.to_string_lossy())
            } else {
                let path = join_rel(root, rel);
                let bytes = fs::read(&path).map_err(|e| FsError::at(&path, e))?;
                let exec = if is_executable(meta) { "x" } else { "-" };
                format!(
                    "f {} {} {}",
                    rel_str,
                    exec,
                    ContentHash::from_bytes(&bytes).hex()
                )
            };
            parts.push(record.into_bytes());
            Ok(())
        })?;

        Ok(ContentHash::from_parts(parts))
    }
}

/// Write via a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> FsResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| FsError::at(&parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| FsError::at(&parent, e))?;
    tmp.write_all(content).map_err(|e| FsError::at(path, e))?;
    tmp.as_file().sync_all().map_err(|e| FsError::at(path, e))?;
    tmp.persist(path).map_err(|e| FsError::at(path, e.error))?;
    Ok(())
}

/// Visit `root` and everything below it, depth-first in name order.
///
/// The visitor receives paths relative to `root` (empty for `root` itself)
/// and metadata that does not follow symlinks.
fn walk<V>(root: &Path, skip: SkipFn<'_>, visit: &mut V) -> FsResult<()>
where
    V: FnMut(&Path, &fs::Metadata) -> FsResult<()>,
{
    let meta = fs::symlink_metadata(root).map_err(|e| FsError::at(root, e))?;
    visit(Path::new(""), &meta)?;
    if meta.is_dir() {
        walk_dir(root, Path::new(""), skip, visit)?;
    }
    Ok(())
}

fn walk_dir<V>(root: &Path, rel: &Path, skip: SkipFn<'_>, visit: &mut V) -> FsResult<()>
where
    V: FnMut(&Path, &fs::Metadata) -> FsResult<()>,
{
    let dir = join_rel(root, rel);
    let mut entries = fs::read_dir(&dir)
        .map_err(|e| FsError::at(&dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FsError::at(&dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let child = rel.join(entry.file_name());
        let meta = fs::symlink_metadata(entry.path()).map_err(|e| FsError::at(&entry.path(), e))?;
        if skip(&child, meta.is_dir()) {
            continue;
        }
        visit(&child, &meta)?;
        if meta.is_dir() {
            walk_dir(root, &child, skip, visit)?;
        }
    }
    Ok(())
}

fn join_rel(base: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(meta: &fs::Metadata) -> bool {
    meta.is_file()
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> FsResult<()> {
    std::os::unix::fs::symlink(target, link).map_err(|e| FsError::at(link, e))
}

#[cfg(not(unix))]
fn make_symlink(target: &Path, link: &Path) -> FsResult<()> {
    Err(FsError::Other(format!(
        "symlinks are not supported on this platform: {} -> {}",
        link.display(),
        target.display()
    )))
}
