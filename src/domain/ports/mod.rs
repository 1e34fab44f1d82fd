//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod base_provider;
pub mod events;
pub mod file_system;
pub mod image_store;
pub mod package_index;
pub mod process_runner;
pub mod stage_cache;

pub use base_provider::{
    BaseLayout, BaseRuntime, BaseRuntimeProvider, DEFAULT_PATH, DEFAULT_SITE_PACKAGES,
};
pub use events::{BuildEvent, EventSink, NoopEventSink, UnitEvent};
pub use file_system::{skip_none, FileSystem, FsError, FsResult, SkipFn};
pub use image_store::{ImageStore, StoredImage};
pub use package_index::{DependencyInstaller, PackageIndex};
pub use process_runner::{ChildProcess, LaunchPlan, ProcessRunner, Termination};
pub use stage_cache::{CacheEntry, Snapshot, StageCache, Staging};
