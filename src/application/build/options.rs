//! Build Options

use std::path::PathBuf;

use crate::domain::entities::RECIPE_FILE;
use crate::domain::value_objects::ImageTag;

/// Options for the build use case
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Build context directory (sources, manifest and recipe live here)
    pub context: PathBuf,
    /// Recipe override (defaults to `<context>/berth.toml`)
    pub recipe: Option<PathBuf>,
    /// Tag override (defaults to the context directory name)
    pub tag: Option<ImageTag>,
    /// Rebuild every stage, replacing existing cache entries
    pub no_cache: bool,
}

impl BuildOptions {
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self {
            context: context.into(),
            recipe: None,
            tag: None,
            no_cache: false,
        }
    }

    pub fn with_recipe(mut self, recipe: impl Into<PathBuf>) -> Self {
        self.recipe = Some(recipe.into());
        self
    }

    pub fn with_tag(mut self, tag: ImageTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Recipe file this build reads.
    pub fn recipe_path(&self) -> PathBuf {
        self.recipe
            .clone()
            .unwrap_or_else(|| self.context.join(RECIPE_FILE))
    }
}
