//! Directory Package Index and installer
//!
//! ```text
//! <index>/<name>/<version>/files/...      copied into site-packages
//! <index>/<name>/<version>/requires.txt   optional, manifest syntax
//! ```
//!
//! Package directory names are normalized the same way manifest names are,
//! so `<index>/Discord.py/` serves `discord-py`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::entities::{BuildManifest, InstalledSet, Requirement, INSTALLED_FILE};
use crate::domain::ports::{skip_none, DependencyInstaller, FileSystem, PackageIndex};
use crate::domain::services::Resolver;
use crate::domain::value_objects::{PackageName, Version};
use crate::error::{BerthError, BerthResult};
use crate::infrastructure::fs::LocalFs;

const REQUIRES_FILE: &str = "requires.txt";
const FILES_DIR: &str = "files";

/// Package index stored as plain directories.
pub struct DirectoryPackageIndex {
    root: PathBuf,
    fs: LocalFs,
}

impl DirectoryPackageIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fs: LocalFs::new(),
        }
    }

    /// Directory of `name`, matching on normalized names.
    fn package_dir(&self, name: &PackageName) -> BerthResult<Option<PathBuf>> {
        let direct = self.root.join(name.as_str());
        if direct.is_dir() {
            return Ok(Some(direct));
        }

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            if PackageName::parse(&file_name.to_string_lossy()).ok().as_ref() == Some(name)
                && entry.path().is_dir()
            {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    /// Version directory as published (`2.31` and `2.31.0` compare equal).
    fn version_dir(&self, name: &PackageName, version: &Version) -> BerthResult<PathBuf> {
        let missing = || BerthError::DependencyResolution {
            entry: name.to_string(),
            package: name.to_string(),
            reason: format!("version {} is not in the index", version),
        };
        let package = self.package_dir(name)?.ok_or_else(missing)?;
        for entry in fs::read_dir(&package)? {
            let entry = entry?;
            let parsed: Result<Version, _> = entry.file_name().to_string_lossy().parse();
            if parsed.as_ref() == Ok(version) && entry.path().is_dir() {
                return Ok(entry.path());
            }
        }
        Err(missing())
    }
}

impl PackageIndex for DirectoryPackageIndex {
    fn versions(&self, name: &PackageName) -> BerthResult<Vec<Version>> {
        let Some(package) = self.package_dir(name)? else {
            return Ok(Vec::new());
        };

        let mut versions = Vec::new();
        for entry in fs::read_dir(&package)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().to_string_lossy().parse::<Version>() {
                Ok(version) => versions.push(version),
                Err(reason) => {
                    tracing::debug!(path = %entry.path().display(), %reason, "skipping index entry")
                }
            }
        }
        versions.sort();
        Ok(versions)
    }

    fn requires(&self, name: &PackageName, version: &Version) -> BerthResult<Vec<Requirement>> {
        let path = self.version_dir(name, version)?.join(REQUIRES_FILE);
        if !self.fs.exists(&path) {
            return Ok(Vec::new());
        }
        let content = self.fs.read(&path)?;
        let manifest =
            BuildManifest::parse(&content, &path).map_err(|e| BerthError::DependencyResolution {
                entry: name.to_string(),
                package: format!("{}=={}", name, version),
                reason: e.to_string(),
            })?;
        Ok(manifest.entries().to_vec())
    }

    fn files(&self, name: &PackageName, version: &Version) -> BerthResult<PathBuf> {
        Ok(self.version_dir(name, version)?.join(FILES_DIR))
    }
}

/// Installs manifests from a `PackageIndex` by copying package trees.
pub struct IndexInstaller<I: PackageIndex> {
    index: I,
    fs: LocalFs,
}

impl<I: PackageIndex> IndexInstaller<I> {
    pub fn new(index: I) -> Self {
        Self {
            index,
            fs: LocalFs::new(),
        }
    }

    /// Map every file a package would install to its owner; two owners
    /// for one path is a conflict.
    fn check_conflicts(&self, plan: &[(PackageName, Version, PathBuf)]) -> BerthResult<()> {
        let mut owners: BTreeMap<PathBuf, String> = BTreeMap::new();
        for (name, version, files) in plan {
            if !files.is_dir() {
                continue;
            }
            let mut conflict: Option<(PathBuf, String)> = None;
            let mut visit = |rel: &Path, is_dir: bool| {
                if !is_dir && conflict.is_none() {
                    let owner = format!("{}=={}", name, version);
                    if let Some(previous) = owners.insert(rel.to_path_buf(), owner) {
                        conflict = Some((rel.to_path_buf(), previous));
                    }
                }
            };
            list_files(files, Path::new(""), &mut visit)?;

            if let Some((path, previous)) = conflict {
                return Err(BerthError::DependencyResolution {
                    entry: name.to_string(),
                    package: format!("{}=={}", name, version),
                    reason: format!(
                        "file '{}' is also installed by {}",
                        path.display(),
                        previous
                    ),
                });
            }
        }
        Ok(())
    }
}

impl<I: PackageIndex> DependencyInstaller for IndexInstaller<I> {
    fn install(&self, manifest: &BuildManifest, site_packages: &Path) -> BerthResult<InstalledSet> {
        let installed = Resolver::new(&self.index).resolve(manifest)?;

        let mut plan = Vec::with_capacity(installed.len());
        for (name, version) in installed.iter() {
            let files = self.index.files(name, version)?;
            plan.push((name.clone(), version.clone(), files));
        }
        self.check_conflicts(&plan)?;

        self.fs.create_dir_all(site_packages)?;
        for (name, version, files) in &plan {
            if !files.is_dir() {
                tracing::debug!(package = %name, %version, "package ships no files");
                continue;
            }
            let copied = self.fs.copy_tree(files, site_packages, &skip_none)?;
            tracing::info!(package = %name, %version, entries = copied, "installed package");
        }

        self.fs
            .write(&site_packages.join(INSTALLED_FILE), &installed.to_toml()?)?;
        Ok(installed)
    }
}

fn list_files<V>(root: &Path, rel: &Path, visit: &mut V) -> BerthResult<()>
where
    V: FnMut(&Path, bool),
{
    let dir = if rel.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    };
    let mut entries = fs::read_dir(&dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let child = rel.join(entry.file_name());
        let is_dir = entry.file_type()?.is_dir();
        visit(&child, is_dir);
        if is_dir {
            list_files(root, &child, visit)?;
        }
    }
    Ok(())
}
