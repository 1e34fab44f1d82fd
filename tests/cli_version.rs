mod common;

use common::TestEnv;

#[test]
fn version_text() {
    let result = TestEnv::new().run(&["version"]);
    assert!(result.success);
    assert_eq!(result.stdout, format!("berth {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_json_ignores_broken_config() {
    let env = TestEnv::new();
    env.write_user_config("not toml at all [");

    let result = env.run(&["version", "--json"]);
    assert!(result.success, "{}", result.combined_output());
    let value: serde_json::Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(value["name"], "berth");
}
