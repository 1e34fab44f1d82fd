//! berth - staged runtime-image builder
//!
//! berth turns a build context (a recipe, a dependency manifest and the
//! application files) into a runnable image through four content-addressed
//! stages:
//!
//! 1. **base** - a pinned interpreter runtime copied from the base directory
//! 2. **dependencies** - manifest packages resolved and installed into the base
//! 3. **artifact** - application files placed under the working directory
//! 4. **launch** - the command, working directory and environment
//!
//! Each stage snapshot is cached under a key chained from its parent, so an
//! edit to the application code never reinstalls dependencies. `berth run`
//! starts exactly one process from the launch directive and tracks it through
//! `CREATED -> STARTING -> RUNNING -> EXITED | CRASHED`.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

// Re-exports for convenience
pub use application::{BuildOptions, BuildResult, BuildUseCase, RunOptions, RunOutcome, RunUseCase};
pub use config::{Config, Settings};
pub use error::{BerthError, BerthResult};
