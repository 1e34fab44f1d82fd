//! Error types for berth
//!
//! Uses `thiserror` for library errors; the binary wraps them in `anyhow`.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::ports::FsError;
use crate::domain::value_objects::Stage;

/// Result type alias for berth operations
pub type BerthResult<T> = Result<T, BerthError>;

/// Main error type for berth operations
#[derive(Error, Debug)]
pub enum BerthError {
    /// Base runtime version does not resolve to a published base
    #[error("base runtime '{version}' not found in {}", .searched.display())]
    BaseNotFound { version: String, searched: PathBuf },

    /// Base exists but its descriptor is unusable
    #[error("base runtime '{version}' is invalid ({}): {message}", .path.display())]
    BaseInvalid {
        version: String,
        path: PathBuf,
        message: String,
    },

    /// Build manifest is not syntactically well-formed
    #[error("invalid manifest {}: {message}", location(.file, .line))]
    ManifestParse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// A declared dependency could not be resolved or installed
    #[error("cannot install '{package}' (required by '{entry}'): {reason}")]
    DependencyResolution {
        entry: String,
        package: String,
        reason: String,
    },

    /// Entrypoint source path does not exist in the build context
    #[error("artifact source not found: {}", .path.display())]
    ArtifactNotFound { path: PathBuf },

    /// Entrypoint source path escapes the build context
    #[error("artifact source '{}' escapes build context '{}'", .path.display(), .context.display())]
    ArtifactOutsideContext { path: PathBuf, context: PathBuf },

    /// Launch program is not present in the image
    #[error("launch target '{program}' not found in image (searched: {})", join_paths(.searched))]
    LaunchTargetMissing {
        program: String,
        searched: Vec<PathBuf>,
    },

    /// Recipe file is missing or malformed
    #[error("invalid recipe {}: {message}", .file.display())]
    RecipeInvalid { file: PathBuf, message: String },

    /// User configuration is malformed or incomplete
    #[error("invalid configuration {}: {message}", .file.display())]
    ConfigInvalid { file: PathBuf, message: String },

    /// Image tag has an invalid format
    #[error("invalid image tag '{tag}': {message}")]
    InvalidTag { tag: String, message: String },

    /// No image stored under this tag
    #[error("image '{tag}' not found")]
    ImageNotFound { tag: String },

    /// Runnable unit state machine rejected a transition
    #[error("invalid unit transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Cache or image store is corrupted or inaccessible
    #[error("store error at {}: {message}", .path.display())]
    Store { path: PathBuf, message: String },

    /// Snapshot file operation failed
    #[error("{0}")]
    Fs(#[from] FsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl BerthError {
    /// The pipeline stage this error belongs to by nature, if any.
    ///
    /// Generic errors (IO, store) carry no stage; the build pipeline attaches
    /// the stage it was running when they occurred.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::BaseNotFound { .. } | Self::BaseInvalid { .. } => Some(Stage::Base),
            Self::ManifestParse { .. } | Self::DependencyResolution { .. } => {
                Some(Stage::Dependencies)
            }
            Self::ArtifactNotFound { .. } | Self::ArtifactOutsideContext { .. } => {
                Some(Stage::Artifact)
            }
            Self::LaunchTargetMissing { .. } => Some(Stage::Launch),
            _ => None,
        }
    }

    /// Short machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BaseNotFound { .. } => "base_not_found",
            Self::BaseInvalid { .. } => "base_invalid",
            Self::ManifestParse { .. } => "manifest_parse",
            Self::DependencyResolution { .. } => "dependency_resolution",
            Self::ArtifactNotFound { .. } => "artifact_not_found",
            Self::ArtifactOutsideContext { .. } => "artifact_outside_context",
            Self::LaunchTargetMissing { .. } => "launch_target_missing",
            Self::RecipeInvalid { .. } => "recipe_invalid",
            Self::ConfigInvalid { .. } => "config_invalid",
            Self::InvalidTag { .. } => "invalid_tag",
            Self::ImageNotFound { .. } => "image_not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Store { .. } => "store",
            Self::Fs(_) | Self::Io(_) => "io",
            Self::TomlDe(_) | Self::TomlSer(_) => "toml",
        }
    }

    pub(crate) fn store(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

fn location(file: &Path, line: &usize) -> String {
    if *line == 0 {
        file.display().to_string()
    } else {
        format!("{}:{}", file.display(), line)
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
