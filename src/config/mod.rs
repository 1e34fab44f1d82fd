//! Configuration module for berth
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (BERTH_*)
//! 3. User config (~/.config/berth/config.toml)
//! 4. Built-in defaults (~/.berth/{store,bases,index})

mod loader;
mod types;

pub use crate::domain::value_objects::ConfigWarning;

pub use loader::{
    load_settings, load_user_config, load_with_warnings, resolve, user_config_path,
    with_env_overrides, CONFIG_FILE, ENV_BASES, ENV_COLOR, ENV_INDEX, ENV_NO_CACHE, ENV_STORE,
};
pub use types::{
    BuildConfig, CliOverrides, ColorMode, Config, OutputConfig, PathsConfig, Settings,
};
