//! Configuration loading and layering

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::value_objects::ConfigWarning;
use crate::error::{BerthError, BerthResult};
use crate::infrastructure::fs::{berth_config_dir, berth_home_dir};

use super::types::{CliOverrides, ColorMode, Config, Settings, KNOWN_KEYS};

/// Directory under the user config dir
pub const CONFIG_DIR: &str = "berth";

/// File name of the user config
pub const CONFIG_FILE: &str = "config.toml";

/// Directory under the home dir holding default store, bases and index
pub const DATA_DIR: &str = ".berth";

pub const ENV_STORE: &str = "BERTH_STORE";
pub const ENV_BASES: &str = "BERTH_BASES";
pub const ENV_INDEX: &str = "BERTH_INDEX";
pub const ENV_NO_CACHE: &str = "BERTH_NO_CACHE";
pub const ENV_COLOR: &str = "BERTH_COLOR";

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> BerthResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| BerthError::ConfigInvalid {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = ConfigWarning::unknown_keys(&content, path, unknown_paths, KNOWN_KEYS);
    Ok((config, warnings))
}

/// `~/.config/berth/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    berth_config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the user config, or defaults when there is none.
pub fn load_user_config() -> BerthResult<(Config, Vec<ConfigWarning>)> {
    match user_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading user config");
            load_with_warnings(&path)
        }
        _ => Ok((Config::default(), Vec::new())),
    }
}

/// Apply environment variable overrides (BERTH_* prefix)
///
/// `lookup` reads one variable; the binary passes `std::env::var`.
pub fn with_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(store) = non_empty(ENV_STORE) {
        config.paths.store = Some(PathBuf::from(store));
    }
    if let Some(bases) = non_empty(ENV_BASES) {
        config.paths.bases = Some(PathBuf::from(bases));
    }
    if let Some(index) = non_empty(ENV_INDEX) {
        config.paths.index = Some(PathBuf::from(index));
    }

    // BERTH_NO_CACHE
    if let Some(val) = non_empty(ENV_NO_CACHE) {
        config.build.no_cache = !matches!(val.to_lowercase().as_str(), "0" | "false" | "no");
    }

    // BERTH_COLOR
    if let Some(val) = non_empty(ENV_COLOR) {
        config.output.color = match val.to_lowercase().as_str() {
            "always" => ColorMode::Always,
            "never" => ColorMode::Never,
            _ => ColorMode::Auto,
        };
    }

    config
}

/// Merge CLI flags over the layered config and fill defaults from `home`.
pub fn resolve(config: Config, cli: &CliOverrides, home: Option<&Path>) -> BerthResult<Settings> {
    let pick = |flag: &Option<PathBuf>, configured: Option<PathBuf>, name: &str| {
        match flag.clone().or(configured) {
            Some(path) => Ok(expand_home(&path, home)),
            None => home
                .map(|h| h.join(DATA_DIR).join(name))
                .ok_or_else(|| BerthError::ConfigInvalid {
                    file: PathBuf::from(CONFIG_FILE),
                    message: format!(
                        "cannot determine home directory; pass --{} or set BERTH_{}",
                        name,
                        name.to_uppercase()
                    ),
                }),
        }
    };

    Ok(Settings {
        store: pick(&cli.store, config.paths.store, "store")?,
        bases: pick(&cli.bases, config.paths.bases, "bases")?,
        index: pick(&cli.index, config.paths.index, "index")?,
        no_cache: cli.no_cache || config.build.no_cache,
        color: config.output.color,
    })
}

/// CLI flags > BERTH_* environment > user config > defaults.
pub fn load_settings(cli: &CliOverrides) -> BerthResult<(Settings, Vec<ConfigWarning>)> {
    let (config, warnings) = load_user_config()?;
    let config = with_env_overrides(config, |name| std::env::var(name).ok());
    let home = berth_home_dir();
    let settings = resolve(config, cli, home.as_deref())?;
    tracing::debug!(
        store = %settings.store.display(),
        bases = %settings.bases.display(),
        index = %settings.index.display(),
        "settings resolved"
    );
    Ok((settings, warnings))
}

/// Expand a leading `~/` against `home`.
fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
