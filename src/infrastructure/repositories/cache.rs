//! Filesystem Stage Cache
//!
//! Implements the StageCache port:
//!
//! ```text
//! <store>/cache/<stage>/<key hex>/entry.toml
//! <store>/cache/<stage>/<key hex>/rootfs/...
//! <store>/tmp/stage-XXXX/             staging, renamed into place on commit
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CacheEntry, FileSystem, Snapshot, StageCache, Staging};
use crate::domain::value_objects::{ContentHash, Stage, StageKey};
use crate::error::{BerthError, BerthResult};
use crate::infrastructure::fs::LocalFs;

const ENTRY_FILE: &str = "entry.toml";

/// TOML representation of a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TomlCacheEntry {
    stage: Stage,
    key: ContentHash,
    #[serde(default)]
    parent: Option<ContentHash>,
    created_at: DateTime<Utc>,
}

/// Stage cache rooted in the berth store.
pub struct FsStageCache {
    store: PathBuf,
    fs: LocalFs,
}

impl FsStageCache {
    pub fn new(store: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            fs: LocalFs::new(),
        }
    }

    fn cache_root(&self) -> PathBuf {
        self.store.join("cache")
    }

    fn entry_dir(&self, stage: Stage, key: &ContentHash) -> PathBuf {
        self.cache_root().join(stage.as_str()).join(key.hex())
    }

    fn read_entry(&self, dir: &Path) -> Result<TomlCacheEntry, String> {
        let content = self
            .fs
            .read(&dir.join(ENTRY_FILE))
            .map_err(|e| e.to_string())?;
        let entry: TomlCacheEntry = toml::from_str(&content).map_err(|e| e.to_string())?;
        if !dir.join("rootfs").is_dir() {
            return Err("snapshot rootfs is missing".to_string());
        }
        Ok(entry)
    }

    /// Drop an entry that can no longer be trusted.
    fn discard(&self, dir: &Path, reason: &str) {
        tracing::warn!(entry = %dir.display(), reason, "discarding stage cache entry");
        if let Err(e) = fs::remove_dir_all(dir) {
            tracing::warn!(entry = %dir.display(), error = %e, "could not remove cache entry");
        }
    }
}

impl StageCache for FsStageCache {
    fn lookup(&self, key: &StageKey) -> BerthResult<Option<Snapshot>> {
        let dir = self.entry_dir(key.stage(), key.key());
        if !dir.exists() {
            return Ok(None);
        }

        match self.read_entry(&dir) {
            Ok(entry) if entry.stage == key.stage() && &entry.key == key.key() => {
                Ok(Some(Snapshot {
                    key: key.clone(),
                    rootfs: dir.join("rootfs"),
                }))
            }
            Ok(_) => {
                self.discard(&dir, "recorded key does not match");
                Ok(None)
            }
            Err(reason) => {
                self.discard(&dir, &reason);
                Ok(None)
            }
        }
    }

    fn prepare(&self, key: &StageKey) -> BerthResult<Staging> {
        let tmp_root = self.store.join("tmp");
        self.fs.create_dir_all(&tmp_root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", key.stage()))
            .tempdir_in(&tmp_root)
            .map_err(|e| BerthError::store(&tmp_root, e))?;
        let staging = Staging::new(key.clone(), dir);
        self.fs.create_dir_all(&staging.rootfs())?;
        Ok(staging)
    }

    fn commit(&self, staging: Staging) -> BerthResult<Snapshot> {
        let (key, tmp) = staging.into_parts();
        let entry = TomlCacheEntry {
            stage: key.stage(),
            key: key.key().clone(),
            parent: key.parent().cloned(),
            created_at: Utc::now(),
        };
        self.fs
            .write(&tmp.path().join(ENTRY_FILE), &toml::to_string(&entry)?)?;

        let dir = self.entry_dir(key.stage(), key.key());
        if let Some(existing) = self.lookup(&key)? {
            tracing::debug!(stage = %key.stage(), "stage already cached; dropping staged copy");
            return Ok(existing);
        }
        if let Some(parent) = dir.parent() {
            self.fs.create_dir_all(parent)?;
        }

        if let Err(e) = fs::rename(tmp.path(), &dir) {
            // Lost a race with a concurrent writer
            if let Some(existing) = self.lookup(&key)? {
                return Ok(existing);
            }
            return Err(BerthError::store(&dir, e));
        }

        tracing::debug!(stage = %key.stage(), key = key.key().short(), "committed stage snapshot");
        Ok(Snapshot {
            key,
            rootfs: dir.join("rootfs"),
        })
    }

    fn entries(&self) -> BerthResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for stage in Stage::ALL {
            let stage_dir = self.cache_root().join(stage.as_str());
            let read = match fs::read_dir(&stage_dir) {
                Ok(read) => read,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(BerthError::store(&stage_dir, e)),
            };
            for dir in read {
                let path = dir?.path();
                match self.read_entry(&path) {
                    Ok(entry) if entry.stage == stage => entries.push(CacheEntry {
                        key: StageKey::from_parts(entry.stage, entry.key, entry.parent),
                        created_at: entry.created_at,
                        path,
                    }),
                    Ok(_) => tracing::debug!(entry = %path.display(), "entry in wrong stage directory"),
                    Err(reason) => tracing::debug!(entry = %path.display(), %reason, "unreadable cache entry"),
                }
            }
        }
        entries.sort_by(|a, b| {
            (a.key.stage(), a.created_at, a.key.key()).cmp(&(b.key.stage(), b.created_at, b.key.key()))
        });
        Ok(entries)
    }

    fn remove(&self, stage: Stage, key: &ContentHash) -> BerthResult<()> {
        let dir = self.entry_dir(stage, key);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BerthError::store(&dir, e)),
        }
    }
}
