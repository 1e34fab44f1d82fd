//! Directory Base Provider
//!
//! Implements the BaseRuntimeProvider port over a directory of bases:
//!
//! ```text
//! <bases>/<version>/rootfs/...
//! <bases>/<version>/base.toml     (optional)
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::domain::ports::{skip_none, BaseLayout, BaseRuntime, BaseRuntimeProvider, FileSystem};
use crate::domain::value_objects::{BaseVersion, ConfigWarning};
use crate::error::{BerthError, BerthResult};
use crate::infrastructure::fs::LocalFs;

/// Descriptor file next to a base's rootfs
pub const BASE_DESCRIPTOR: &str = "base.toml";

const KNOWN_KEYS: &[&str] = &["site_packages", "path", "env"];

/// Bases stored as plain directories.
pub struct DirectoryBaseProvider {
    root: PathBuf,
    fs: LocalFs,
}

impl DirectoryBaseProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fs: LocalFs::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_layout(&self, version: &BaseVersion, dir: &Path) -> BerthResult<BaseLayout> {
        let path = dir.join(BASE_DESCRIPTOR);
        if !self.fs.exists(&path) {
            return Ok(BaseLayout::default());
        }
        let content = self.fs.read(&path).map_err(|e| BerthError::BaseInvalid {
            version: version.to_string(),
            path: path.clone(),
            message: e.to_string(),
        })?;
        parse_descriptor(version, &path, &content)
    }
}

/// Parse and validate a `base.toml` read from `path`.
///
/// Unknown keys are logged and ignored. A valid layout has a non-empty
/// `site_packages` inside the rootfs and only absolute `path` entries.
pub fn parse_descriptor(
    version: &BaseVersion,
    path: &Path,
    content: &str,
) -> BerthResult<BaseLayout> {
    let invalid = |message: String| BerthError::BaseInvalid {
        version: version.to_string(),
        path: path.to_path_buf(),
        message,
    };

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(content);
    let layout: BaseLayout = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| invalid(e.to_string().trim_end().to_string()))?;

    for warning in ConfigWarning::unknown_keys(content, path, unknown_paths, KNOWN_KEYS) {
        tracing::warn!(%warning, "ignoring base descriptor key");
    }

    let relative = layout
        .site_packages
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if layout.site_packages.as_os_str().is_empty() || !relative {
        return Err(invalid(format!(
            "site_packages '{}' must be a relative path inside the rootfs",
            layout.site_packages.display()
        )));
    }
    if let Some(bad) = layout.path.iter().find(|p| !p.starts_with('/')) {
        return Err(invalid(format!("path entry '{}' must be absolute", bad)));
    }

    Ok(layout)
}

impl BaseRuntimeProvider for DirectoryBaseProvider {
    fn resolve(&self, version: &BaseVersion) -> BerthResult<BaseRuntime> {
        let dir = self.root.join(version.as_str());
        let rootfs = dir.join("rootfs");
        if !rootfs.is_dir() {
            return Err(BerthError::BaseNotFound {
                version: version.to_string(),
                searched: self.root.clone(),
            });
        }

        let layout = self.load_layout(version, &dir)?;
        let digest = self.fs.tree_digest(&dir, &skip_none)?;
        tracing::debug!(%version, digest = digest.short(), "resolved base runtime");

        Ok(BaseRuntime {
            version: version.clone(),
            rootfs,
            layout,
            digest,
        })
    }

    fn available(&self) -> BerthResult<Vec<BaseVersion>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().join("rootfs").is_dir() {
                continue;
            }
            if let Ok(version) = BaseVersion::parse(&entry.file_name().to_string_lossy()) {
                versions.push(version);
            }
        }
        versions.sort();
        Ok(versions)
    }
}
