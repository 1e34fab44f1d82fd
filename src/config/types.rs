//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BerthResult;

use super::loader;
use crate::domain::value_objects::ConfigWarning;

/// Store and source directory overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Stage cache and image store root
    pub store: Option<PathBuf>,
    /// Directory of published base runtimes
    pub bases: Option<PathBuf>,
    /// Local package index
    pub index: Option<PathBuf>,
}

/// Build defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Never reuse stage cache entries
    pub no_cache: bool,
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Whether console output is decorated, given whether stderr is a terminal.
    pub fn decorate(&self, is_terminal: bool) -> bool {
        match self {
            ColorMode::Auto => is_terminal,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub color: ColorMode,
}

/// Contents of `~/.config/berth/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub build: BuildConfig,
    pub output: OutputConfig,
}

/// Keys accepted in the config file, for "did you mean" suggestions
pub(crate) const KNOWN_KEYS: &[&str] = &[
    "paths", "store", "bases", "index", "build", "no_cache", "output", "color",
];

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> BerthResult<Self> {
        Ok(Self::load_with_warnings(path)?.0)
    }

    /// Load configuration and collect unknown-key warnings
    pub fn load_with_warnings(path: &Path) -> BerthResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }
}

/// Fully resolved settings the commands run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: PathBuf,
    pub bases: PathBuf,
    pub index: PathBuf,
    pub no_cache: bool,
    pub color: ColorMode,
}

/// Values given on the command line (highest precedence)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub store: Option<PathBuf>,
    pub bases: Option<PathBuf>,
    pub index: Option<PathBuf>,
    pub no_cache: bool,
}
