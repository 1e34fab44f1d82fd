//! Home directory resolution with test isolation support.
//!
//! `dirs::home_dir()` ignores `HOME` on some platforms, so integration tests
//! point berth at a throwaway home through `BERTH_TEST_HOME` instead.
//!
//! Used for the default store, bases and index locations and for the user
//! config file.

use std::path::PathBuf;

/// Environment variable for test isolation of home directory.
pub const BERTH_TEST_HOME_VAR: &str = "BERTH_TEST_HOME";

/// Home directory for berth-internal paths (`~/.berth/...`).
pub fn berth_home_dir() -> Option<PathBuf> {
    std::env::var(BERTH_TEST_HOME_VAR)
        .ok()
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

/// Directory holding the user config (`~/.config` on Linux).
pub fn berth_config_dir() -> Option<PathBuf> {
    match std::env::var(BERTH_TEST_HOME_VAR) {
        Ok(home) => Some(PathBuf::from(home).join(".config")),
        Err(_) => dirs::config_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn berth_home_dir_respects_test_home_env_var() {
        let test_home = "/test/fake/home";

        std::env::set_var(BERTH_TEST_HOME_VAR, test_home);
        let home = berth_home_dir();
        let config = berth_config_dir();
        std::env::remove_var(BERTH_TEST_HOME_VAR);

        assert_eq!(home, Some(PathBuf::from(test_home)));
        assert_eq!(config, Some(PathBuf::from("/test/fake/home/.config")));
    }
}
