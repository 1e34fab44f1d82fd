//! Directory resolution: CLI flags, `BERTH_*` variables and the user config.

#![cfg(unix)]

mod common;

use common::*;

#[test]
fn store_flag_overrides_default_location() {
    let env = TestEnv::with_bot_scenario();
    let store = env.home().join("elsewhere");
    let context = env.context();

    let result = env.run(&[
        "build",
        context.to_str().unwrap(),
        "--store",
        store.to_str().unwrap(),
    ]);
    assert!(result.success, "{}", result.combined_output());
    assert!(store.join("images/bot").exists());
    assert!(!env.store().exists());
}

#[test]
fn environment_overrides_user_config() {
    let env = TestEnv::with_bot_scenario();
    let from_config = env.home().join("from-config");
    let from_env = env.home().join("from-env");
    env.write_user_config(&format!("[paths]\nstore = \"{}\"\n", from_config.display()));

    let context = env.context();
    let result = env.run_with_env(
        &["build", context.to_str().unwrap()],
        &[("BERTH_STORE", from_env.to_str().unwrap())],
    );
    assert!(result.success, "{}", result.combined_output());
    assert!(from_env.join("images/bot").exists());
    assert!(!from_config.exists());
}

#[test]
fn user_config_with_unknown_key_warns() {
    let env = TestEnv::with_bot_scenario();
    env.write_user_config("[paths]\nstroe = \"/tmp/x\"\n");

    let result = env.run(&["images"]);
    assert!(result.success, "{}", result.combined_output());
    assert!(result.stderr.contains("warning:"), "{}", result.stderr);
    assert!(result.stderr.contains("store"), "{}", result.stderr);
}

#[test]
fn malformed_user_config_is_an_error() {
    let env = TestEnv::new();
    env.write_user_config("[paths\n");

    let result = env.run(&["images"]);
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("invalid configuration"), "{}", result.stderr);
}
