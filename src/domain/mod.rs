//! Domain Layer
//!
//! The core of berth: the build-and-launch contract without I/O concerns.
//!
//! ## Structure
//!
//! - `entities/` - Recipe, BuildManifest, LaunchDirective, RuntimeImage, RunnableUnit
//! - `value_objects/` - Immutable value types (Stage, Version, ContentHash)
//! - `services/` - Resolver, launch target resolution, placement rules
//! - `ports/` - Interface definitions for infrastructure
//!
//! Entities may read their own source file (`Recipe::load`,
//! `BuildManifest::load`); everything else goes through ports.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
