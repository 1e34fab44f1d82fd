//! Build recipe entity (`berth.toml`)
//!
//! The recipe names the base runtime, the manifest, the entrypoint sources
//! and the launch command. It is parsed once per build and validated here;
//! unknown keys are reported as warnings rather than errors.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::domain::entities::LaunchDirective;
use crate::domain::value_objects::{BaseVersion, ConfigWarning};
use crate::error::{BerthError, BerthResult};

/// Recipe file name at the build context root
pub const RECIPE_FILE: &str = "berth.toml";

/// Manifest used when `[dependencies] manifest` is absent
pub const DEFAULT_MANIFEST: &str = "requirements.txt";

/// Working directory used when `[artifact] workdir` is absent
pub const DEFAULT_WORKDIR: &str = "/app";

const KNOWN_KEYS: &[&str] = &[
    "base",
    "version",
    "dependencies",
    "manifest",
    "artifact",
    "sources",
    "workdir",
    "launch",
    "command",
    "env",
];

#[derive(Debug, Deserialize)]
struct RecipeFile {
    base: BaseSection,
    #[serde(default)]
    dependencies: DependenciesSection,
    artifact: ArtifactSection,
    launch: LaunchSection,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct BaseSection {
    version: String,
}

#[derive(Debug, Deserialize)]
struct DependenciesSection {
    #[serde(default = "default_manifest")]
    manifest: PathBuf,
}

impl Default for DependenciesSection {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactSection {
    sources: Vec<PathBuf>,
    #[serde(default = "default_workdir")]
    workdir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LaunchSection {
    command: Vec<String>,
}

fn default_manifest() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST)
}

fn default_workdir() -> PathBuf {
    PathBuf::from(DEFAULT_WORKDIR)
}

/// Validated build recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    file: PathBuf,
    base: BaseVersion,
    manifest: PathBuf,
    sources: Vec<PathBuf>,
    launch: LaunchDirective,
    env: BTreeMap<String, String>,
}

impl Recipe {
    /// Parse recipe content. `file` is used in errors and warnings.
    pub fn parse(content: &str, file: &Path) -> BerthResult<(Self, Vec<ConfigWarning>)> {
        let invalid = |message: String| BerthError::RecipeInvalid {
            file: file.to_path_buf(),
            message,
        };

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(content);
        let raw: RecipeFile = serde_ignored::deserialize(deserializer, |p| {
            unknown_paths.push(p.to_string());
        })
        .map_err(|e| invalid(e.to_string().trim_end().to_string()))?;

        let warnings = ConfigWarning::unknown_keys(content, file, unknown_paths, KNOWN_KEYS);

        let base = BaseVersion::parse(&raw.base.version).map_err(invalid)?;

        if !is_context_relative(&raw.dependencies.manifest) {
            return Err(invalid(format!(
                "manifest path '{}' must be relative to the build context",
                raw.dependencies.manifest.display()
            )));
        }

        if raw.artifact.sources.is_empty() {
            return Err(invalid("[artifact] sources must not be empty".to_string()));
        }

        let workdir = raw.artifact.workdir;
        if !workdir.has_root()
            || workdir
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(invalid(format!(
                "workdir '{}' must be an absolute path without '..'",
                workdir.display()
            )));
        }

        let launch = LaunchDirective::from_command(&raw.launch.command, &workdir).map_err(invalid)?;

        for key in raw.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(invalid(format!("invalid environment variable name '{}'", key)));
            }
        }

        Ok((
            Self {
                file: file.to_path_buf(),
                base,
                manifest: raw.dependencies.manifest,
                sources: raw.artifact.sources,
                launch,
                env: raw.env,
            },
            warnings,
        ))
    }

    /// Read and parse a recipe file.
    pub fn load(path: &Path) -> BerthResult<(Self, Vec<ConfigWarning>)> {
        let content = std::fs::read_to_string(path).map_err(|e| BerthError::RecipeInvalid {
            file: path.to_path_buf(),
            message: match e.kind() {
                std::io::ErrorKind::NotFound => "file not found".to_string(),
                _ => e.to_string(),
            },
        })?;
        Self::parse(&content, path)
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn base(&self) -> &BaseVersion {
        &self.base
    }

    /// Manifest path, relative to the build context
    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Entrypoint sources, relative to the build context
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn workdir(&self) -> &Path {
        self.launch.workdir()
    }

    pub fn launch(&self) -> &LaunchDirective {
        &self.launch
    }

    /// Image environment defaults declared by the recipe
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

fn is_context_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
