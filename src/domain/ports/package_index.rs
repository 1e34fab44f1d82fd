//! Package index and dependency installer ports

use std::path::Path;

use crate::domain::entities::{BuildManifest, InstalledSet, Requirement};
use crate::domain::value_objects::{PackageName, Version};
use crate::error::BerthResult;

/// Source of installable packages.
pub trait PackageIndex {
    /// All published versions of `name`. Unknown packages yield an empty list.
    fn versions(&self, name: &PackageName) -> BerthResult<Vec<Version>>;

    /// Requirements declared by one published version.
    fn requires(&self, name: &PackageName, version: &Version) -> BerthResult<Vec<Requirement>>;

    /// Directory whose contents are installed for this version.
    fn files(&self, name: &PackageName, version: &Version) -> BerthResult<std::path::PathBuf>;
}

/// Installs a manifest into a package directory.
///
/// On error the directory may hold a partial install; callers discard the
/// staging snapshot it lives in.
pub trait DependencyInstaller {
    fn install(&self, manifest: &BuildManifest, site_packages: &Path) -> BerthResult<InstalledSet>;
}
