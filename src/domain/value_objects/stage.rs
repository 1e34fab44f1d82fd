//! Build stages and their cache keys
//!
//! The pipeline is an explicit chain: every stage key folds in the key of
//! the stage before it, so a change upstream invalidates everything
//! downstream and nothing upstream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ContentHash;

/// A stage of the build pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Base,
    Dependencies,
    Artifact,
    Launch,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Base,
        Stage::Dependencies,
        Stage::Artifact,
        Stage::Launch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Base => "base",
            Stage::Dependencies => "dependencies",
            Stage::Artifact => "artifact",
            Stage::Launch => "launch",
        }
    }

    /// The stage whose snapshot this stage consumes.
    pub fn parent(&self) -> Option<Stage> {
        match self {
            Stage::Base => None,
            Stage::Dependencies => Some(Stage::Base),
            Stage::Artifact => Some(Stage::Dependencies),
            Stage::Launch => Some(Stage::Artifact),
        }
    }

    /// Whether this stage produces a filesystem snapshot (launch only adds metadata).
    pub fn produces_snapshot(&self) -> bool {
        !matches!(self, Stage::Launch)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Stage::Base),
            "dependencies" => Ok(Stage::Dependencies),
            "artifact" => Ok(Stage::Artifact),
            "launch" => Ok(Stage::Launch),
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

/// Cache key of one stage, chained to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageKey {
    stage: Stage,
    key: ContentHash,
    parent: Option<ContentHash>,
}

impl StageKey {
    /// Key for the first stage of the chain.
    pub fn root<I, S>(stage: Stage, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            stage,
            key: Self::digest(stage, None, inputs),
            parent: None,
        }
    }

    /// Key for a stage consuming `parent`'s output.
    pub fn derive<I, S>(parent: &StageKey, stage: Stage, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            stage,
            key: Self::digest(stage, Some(&parent.key), inputs),
            parent: Some(parent.key.clone()),
        }
    }

    /// Rebuild a key from stored parts (cache entries, image metadata).
    pub fn from_parts(stage: Stage, key: ContentHash, parent: Option<ContentHash>) -> Self {
        Self { stage, key, parent }
    }

    fn digest<I, S>(stage: Stage, parent: Option<&ContentHash>, inputs: I) -> ContentHash
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let head: Vec<Vec<u8>> = vec![
            stage.as_str().as_bytes().to_vec(),
            parent.map(|p| p.as_str()).unwrap_or("").as_bytes().to_vec(),
        ];
        let tail = inputs.into_iter().map(|i| i.as_ref().to_vec());
        ContentHash::from_parts(head.into_iter().chain(tail))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn key(&self) -> &ContentHash {
        &self.key
    }

    pub fn parent(&self) -> Option<&ContentHash> {
        self.parent.as_ref()
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.stage, self.key.short())
    }
}
