//! Presentation Layer
//!
//! This layer handles:
//! - Creating use cases with infrastructure dependencies
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `factory` - Creates use cases with proper dependencies (dependency injection)
//! - `output` - Output rendering for command results
//!
//! ## Usage
//!
//! ```ignore
//! use berth::presentation::factory;
//!
//! let use_case = factory::create_build_use_case(&settings);
//! let result = use_case.execute(&options);
//! ```

pub mod factory;
pub mod output;

pub use factory::{create_build_use_case, create_cache_use_case, create_run_use_case};
pub use output::OutputFormat;
