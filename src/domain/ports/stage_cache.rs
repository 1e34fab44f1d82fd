//! Stage cache port
//!
//! Content-addressed snapshots, one per (stage, key). An entry is only a hit
//! when its recorded key equals the requested one; anything else is a miss.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{ContentHash, Stage, StageKey};
use crate::error::BerthResult;

/// A committed stage snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub key: StageKey,
    /// Root of the snapshot filesystem
    pub rootfs: PathBuf,
}

/// Listing row for `berth cache ls` and pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: StageKey,
    pub created_at: DateTime<Utc>,
    /// Entry directory (removing it removes the entry)
    pub path: PathBuf,
}

/// An in-progress snapshot. Dropping it without committing discards it.
#[derive(Debug)]
pub struct Staging {
    key: StageKey,
    dir: tempfile::TempDir,
}

impl Staging {
    pub fn new(key: StageKey, dir: tempfile::TempDir) -> Self {
        Self { key, dir }
    }

    pub fn key(&self) -> &StageKey {
        &self.key
    }

    /// Directory the stage writes its filesystem into
    pub fn rootfs(&self) -> PathBuf {
        self.dir.path().join("rootfs")
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn into_parts(self) -> (StageKey, tempfile::TempDir) {
        (self.key, self.dir)
    }
}

pub trait StageCache {
    /// Committed snapshot for exactly this key, if any.
    fn lookup(&self, key: &StageKey) -> BerthResult<Option<Snapshot>>;

    /// Start a new snapshot for `key` (empty `rootfs/`).
    fn prepare(&self, key: &StageKey) -> BerthResult<Staging>;

    /// Atomically make a staged snapshot visible.
    fn commit(&self, staging: Staging) -> BerthResult<Snapshot>;

    fn entries(&self) -> BerthResult<Vec<CacheEntry>>;

    fn remove(&self, stage: Stage, key: &ContentHash) -> BerthResult<()>;
}
