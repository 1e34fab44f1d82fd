//! Domain Value Objects
//!
//! Immutable, validated value types shared by entities and services.

mod base_version;
mod config_warning;
mod hash;
mod image_tag;
mod package_name;
mod stage;
mod version;

pub use base_version::BaseVersion;
pub use config_warning::ConfigWarning;
pub use hash::ContentHash;
pub use image_tag::ImageTag;
pub use package_name::PackageName;
pub use stage::{Stage, StageKey};
pub use version::{Constraint, Operator, Version, VersionReq};
