//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - Local file system (atomic writes, tree copy, tree digest)
//! - `repositories/` - Bases, package index, stage cache, image store
//! - `events/` - Console and NDJSON event sinks
//! - `process/` - Host process runner

pub mod events;
pub mod fs;
pub mod process;
pub mod repositories;

// Re-export for convenience
pub use events::{ConsoleEventSink, JsonEventSink};
pub use fs::LocalFs;
pub use process::LocalProcessRunner;
pub use repositories::{
    DirectoryBaseProvider, DirectoryPackageIndex, FsImageStore, FsStageCache, IndexInstaller,
};
