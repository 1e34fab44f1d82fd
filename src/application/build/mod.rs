//! Build Module
//!
//! Turns a build context into a tagged runtime image.
//!
//! ## Structure
//!
//! - `options` - Input of a build (`BuildOptions`)
//! - `result` - Outcome types (`BuildResult`, `StageOutcome`, `BuildFailure`)
//! - `use_case` - The staged pipeline (`BuildUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use berth::application::build::{BuildOptions, BuildUseCase};
//!
//! let use_case = BuildUseCase::new(bases, installer, cache, images, fs);
//! let result = use_case.execute(&BuildOptions::new("./bot"))?;
//! ```

mod options;
mod result;
mod use_case;

pub use options::BuildOptions;
pub use result::{BuildFailure, BuildResult, StageOutcome};
pub use use_case::BuildUseCase;

#[cfg(test)]
mod tests;
