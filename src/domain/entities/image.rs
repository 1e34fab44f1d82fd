//! Runtime image metadata (`image.toml`)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::LaunchDirective;
use crate::domain::value_objects::{ContentHash, Stage, StageKey};

/// Current `image.toml` format version
pub const IMAGE_FORMAT_VERSION: u32 = 1;

/// Keys of the four stages that produced an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStages {
    pub base: ContentHash,
    pub dependencies: ContentHash,
    pub artifact: ContentHash,
    pub launch: ContentHash,
}

impl ImageStages {
    pub fn get(&self, stage: Stage) -> &ContentHash {
        match stage {
            Stage::Base => &self.base,
            Stage::Dependencies => &self.dependencies,
            Stage::Artifact => &self.artifact,
            Stage::Launch => &self.launch,
        }
    }

    /// Stage keys as a chain, in pipeline order.
    pub fn keys(&self) -> Vec<StageKey> {
        let mut parent: Option<ContentHash> = None;
        Stage::ALL
            .iter()
            .map(|stage| {
                let key = self.get(*stage).clone();
                let stage_key = StageKey::from_parts(*stage, key.clone(), parent.take());
                parent = Some(key);
                stage_key
            })
            .collect()
    }
}

/// A built, tagged image: a rootfs snapshot plus this metadata.
///
/// `digest` covers the rootfs only; `built_at` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeImage {
    pub version: u32,
    pub tag: String,
    pub digest: ContentHash,
    pub built_at: DateTime<Utc>,
    pub base_version: String,
    /// Executable search path inside the image
    pub path: Vec<String>,
    pub stages: ImageStages,
    pub launch: LaunchDirective,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
}

impl RuntimeImage {
    /// Key of the snapshot the image's rootfs was taken from
    pub fn snapshot_key(&self) -> &ContentHash {
        &self.stages.artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn sample() -> RuntimeImage {
        RuntimeImage {
            version: IMAGE_FORMAT_VERSION,
            tag: "bot".to_string(),
            digest: ContentHash::from_content("rootfs"),
            built_at: DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            base_version: "3.11".to_string(),
            path: vec!["/usr/local/bin".to_string(), "/usr/bin".to_string()],
            stages: ImageStages {
                base: ContentHash::from_content("b"),
                dependencies: ContentHash::from_content("d"),
                artifact: ContentHash::from_content("a"),
                launch: ContentHash::from_content("l"),
            },
            launch: LaunchDirective::new(
                "python",
                vec!["bot_main.py".to_string()],
                Path::new("/app"),
            ),
            env: BTreeMap::new(),
            packages: BTreeMap::from([("requests".to_string(), "2.31.0".to_string())]),
        }
    }

    #[test]
    fn toml_round_trip_keeps_launch_directive() {
        let image = sample();
        let content = toml::to_string(&image).unwrap();
        assert!(content.contains("[launch]"));
        assert!(content.contains("program = \"python\""));
        let parsed: RuntimeImage = toml::from_str(&content).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn stage_keys_chain_in_order() {
        let image = sample();
        let keys = image.stages.keys();
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[0].parent(), None);
        assert_eq!(keys[1].parent(), Some(keys[0].key()));
        assert_eq!(keys[3].stage(), Stage::Launch);
        assert_eq!(image.snapshot_key(), keys[2].key());
    }
}
