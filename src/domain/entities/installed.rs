//! Installed package set
//!
//! Recorded inside the dependency snapshot so later stages (and `inspect`)
//! can see exactly what was installed without re-resolving.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{PackageName, Version};
use crate::error::BerthResult;

/// File name of the record, inside the site-packages directory
pub const INSTALLED_FILE: &str = "berth-installed.toml";

/// Resolved `name -> version` map, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstalledSet {
    packages: BTreeMap<PackageName, Version>,
}

#[derive(Serialize, Deserialize, Default)]
struct InstalledFile {
    #[serde(default)]
    packages: BTreeMap<String, String>,
}

impl InstalledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: PackageName, version: Version) {
        self.packages.insert(name, version);
    }

    pub fn get(&self, name: &PackageName) -> Option<&Version> {
        self.packages.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &Version)> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Plain string map, as stored in image metadata.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.packages
            .iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect()
    }

    pub fn to_toml(&self) -> BerthResult<String> {
        let file = InstalledFile {
            packages: self.to_map(),
        };
        Ok(toml::to_string(&file)?)
    }

    /// Parse a stored record. Entries that no longer validate are an error.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let file: InstalledFile = toml::from_str(content).map_err(|e| e.to_string())?;
        let mut set = Self::new();
        for (name, version) in file.packages {
            set.insert(PackageName::parse(&name)?, version.parse()?);
        }
        Ok(set)
    }
}

impl FromIterator<(PackageName, Version)> for InstalledSet {
    fn from_iter<T: IntoIterator<Item = (PackageName, Version)>>(iter: T) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}
