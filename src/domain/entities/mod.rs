//! Domain Entities
//!
//! - `Recipe` - A parsed `berth.toml`
//! - `BuildManifest` - Dependency declarations
//! - `LaunchDirective` - The one process an image starts
//! - `InstalledSet` - Resolved package versions
//! - `RuntimeImage` - Metadata of a built image
//! - `RunnableUnit` - One execution of an image

mod image;
mod installed;
mod launch;
mod manifest;
mod recipe;
mod unit;

pub use image::{ImageStages, RuntimeImage, IMAGE_FORMAT_VERSION};
pub use installed::{InstalledSet, INSTALLED_FILE};
pub use launch::LaunchDirective;
pub use manifest::{BuildManifest, Requirement};
pub use recipe::{Recipe, DEFAULT_MANIFEST, DEFAULT_WORKDIR, RECIPE_FILE};
pub use unit::{RunnableUnit, UnitState};
