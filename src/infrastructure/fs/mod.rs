//! File System Implementations
//!
//! Concrete implementations of the FileSystem port.

mod home;
mod local;

pub use home::{berth_config_dir, berth_home_dir, BERTH_TEST_HOME_VAR};
pub use local::{atomic_write, LocalFs};
