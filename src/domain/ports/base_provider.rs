//! Base Runtime Provider port
//!
//! Resolves a version identifier to exactly one immutable base filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::value_objects::{BaseVersion, ContentHash};
use crate::error::BerthResult;

/// Default package directory, relative to the rootfs
pub const DEFAULT_SITE_PACKAGES: &str = "usr/local/lib/site-packages";

/// Default executable search path inside the image
pub const DEFAULT_PATH: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin"];

/// Layout of a base, as described by its optional `base.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BaseLayout {
    /// Where dependencies are installed, relative to the rootfs
    pub site_packages: PathBuf,
    /// Executable search path (absolute paths inside the image)
    pub path: Vec<String>,
    /// Environment defaults for processes started from this base
    pub env: BTreeMap<String, String>,
}

impl Default for BaseLayout {
    fn default() -> Self {
        Self {
            site_packages: PathBuf::from(DEFAULT_SITE_PACKAGES),
            path: DEFAULT_PATH.iter().map(|s| s.to_string()).collect(),
            env: BTreeMap::new(),
        }
    }
}

/// A resolved base runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRuntime {
    pub version: BaseVersion,
    /// Root of the base filesystem
    pub rootfs: PathBuf,
    pub layout: BaseLayout,
    /// Digest of the whole base directory (rootfs and descriptor)
    pub digest: ContentHash,
}

impl BaseRuntime {
    /// Absolute host path of the package directory under `rootfs`.
    pub fn site_packages_in(&self, rootfs: &Path) -> PathBuf {
        rootfs.join(&self.layout.site_packages)
    }
}

/// Resolves base versions. Resolution is idempotent and never retried.
pub trait BaseRuntimeProvider {
    /// `BaseNotFound` when the version does not resolve.
    fn resolve(&self, version: &BaseVersion) -> BerthResult<BaseRuntime>;

    /// Versions available to `resolve`, sorted.
    fn available(&self) -> BerthResult<Vec<BaseVersion>>;
}
