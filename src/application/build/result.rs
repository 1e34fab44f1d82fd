//! Build Result
//!
//! Result types for build operations.

use std::fmt;

use crate::domain::entities::InstalledSet;
use crate::domain::ports::StoredImage;
use crate::domain::value_objects::{ContentHash, Stage};
use crate::error::BerthError;

/// What happened to one stage of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    pub key: ContentHash,
    /// Reused from the stage cache instead of executed
    pub cached: bool,
    pub detail: Option<String>,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// The published image
    pub image: StoredImage,
    /// One outcome per stage, in pipeline order
    pub stages: Vec<StageOutcome>,
    /// Packages present in the image
    pub installed: InstalledSet,
    /// Non-fatal problems reported along the way
    pub warnings: Vec<String>,
}

impl BuildResult {
    pub fn tag(&self) -> &str {
        &self.image.metadata.tag
    }

    pub fn digest(&self) -> &ContentHash {
        &self.image.metadata.digest
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|o| o.stage == stage)
    }

    pub fn was_cached(&self, stage: Stage) -> bool {
        self.outcome(stage).is_some_and(|o| o.cached)
    }
}

/// A failed build: the stage that was running and what went wrong.
///
/// `stage` is `None` for failures outside the pipeline (recipe loading,
/// tag derivation, publishing).
#[derive(Debug)]
pub struct BuildFailure {
    pub stage: Option<Stage>,
    pub error: BerthError,
}

impl BuildFailure {
    pub fn at(stage: Stage, error: BerthError) -> Self {
        Self {
            stage: Some(stage),
            error,
        }
    }

    pub fn outside_stages(error: BerthError) -> Self {
        Self { stage: None, error }
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "build failed in {} stage: {}", stage, self.error),
            None => write!(f, "build failed: {}", self.error),
        }
    }
}

impl std::error::Error for BuildFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
