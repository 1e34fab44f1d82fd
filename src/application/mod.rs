//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `BuildUseCase` - Runs the staged pipeline and publishes a tagged image
//! - `RunUseCase` - Starts a tagged image as one runnable unit
//! - `CacheUseCase` - Lists and prunes the stage cache

pub mod build;
pub mod cache;
pub mod run;

pub use build::{BuildFailure, BuildOptions, BuildResult, BuildUseCase, StageOutcome};
pub use cache::{CacheListing, CacheUseCase, PruneResult};
pub use run::{RunFailure, RunOptions, RunOutcome, RunUseCase};
