//! Repository Implementations
//!
//! Directory-backed implementations of the base, index, cache and image ports.

mod base;
mod cache;
mod images;
mod index;

pub use base::{parse_descriptor, DirectoryBaseProvider, BASE_DESCRIPTOR};
pub use cache::FsStageCache;
pub use images::FsImageStore;
pub use index::{DirectoryPackageIndex, IndexInstaller};
