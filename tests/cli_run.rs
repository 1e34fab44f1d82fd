//! `berth run`: the unit lifecycle and exit-code propagation.

#![cfg(unix)]

mod common;

use common::*;

fn transitions(result: &TestResult) -> Vec<String> {
    result
        .stderr_events()
        .into_iter()
        .filter(|e| e["event"] == "transition")
        .filter_map(|e| e["to"]["state"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn bot_scenario_runs_to_exited_zero() {
    let env = TestEnv::with_bot_scenario();
    let build = env.build(&[]);
    assert!(build.success, "{}", build.combined_output());

    let result = env.run(&["run", "bot", "--json"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.starts_with("bot online in "), "{}", result.stdout);
    assert!(result.stdout.trim_end().ends_with("/rootfs/app"), "{}", result.stdout);

    assert_eq!(transitions(&result), ["STARTING", "RUNNING", "EXITED"]);
    let finished = result
        .stderr_events()
        .into_iter()
        .find(|e| e["event"] == "unit_finished")
        .expect("unit_finished");
    assert_eq!(finished["state"], "EXITED");
    assert_eq!(finished["exit_code"], 0);
}

#[test]
fn child_exit_code_becomes_berth_exit_code() {
    let env = TestEnv::with_bot_scenario();
    env.write_context_file("bot_main.py", EXIT_CODE_ENTRYPOINT);
    assert!(env.build(&[]).success);

    let result = env.run_with_env(&["run", "bot"], &[("BOT_EXIT", "3")]);
    assert_eq!(result.exit_code, 3, "{}", result.combined_output());
    assert_eq!(result.stdout, "exiting with 3\n");
}

#[test]
fn text_mode_keeps_stdout_for_the_child() {
    let env = TestEnv::with_bot_scenario();
    assert!(env.build(&[]).success);

    let result = env.run(&["run", "bot"]);
    assert!(result.success, "{}", result.combined_output());
    assert_eq!(result.stdout.lines().count(), 1, "{}", result.stdout);
}

#[test]
fn installed_packages_are_visible_to_the_process() {
    let env = TestEnv::with_bot_scenario();
    env.write_context_file("bot_main.py", IMPORT_CHECK_ENTRYPOINT);
    env.write_context_file(
        "berth.toml",
        &format!("{SCENARIO_RECIPE}\n[env]\nBOT_SITE = \"${{ROOTFS}}/usr/local/lib/site-packages\"\n"),
    );
    assert!(env.build(&[]).success);

    let result = env.run(&["run", "bot"]);
    assert!(result.success, "{}", result.combined_output());
    for package in ["certifi", "idna", "requests"] {
        assert!(result.stdout.contains(package), "missing {package}: {}", result.stdout);
    }
}

#[test]
fn missing_launch_target_crashes_the_unit() {
    let env = TestEnv::with_bot_scenario();
    env.write_context_file(
        "berth.toml",
        &SCENARIO_RECIPE.replace("[\"python\", \"bot_main.py\"]", "[\"ruby\", \"bot_main.py\"]"),
    );
    let build = env.build(&[]);
    assert!(build.success, "{}", build.combined_output());

    let result = env.run(&["run", "bot", "--json"]);
    assert_eq!(result.exit_code, 1);
    assert_eq!(transitions(&result), ["STARTING", "CRASHED"]);

    let error = result
        .stdout_events()
        .into_iter()
        .find(|e| e["event"] == "error")
        .expect("error event");
    assert_eq!(error["kind"], "launch_target_missing");
}

#[test]
fn unknown_image_fails_without_starting() {
    let env = TestEnv::with_bot_scenario();
    let result = env.run(&["run", "ghost"]);
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("ghost"), "{}", result.stderr);
}

#[test]
fn sigterm_to_berth_stops_the_unit_and_reports_its_exit() {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::time::{Duration, Instant};

    let env = TestEnv::with_bot_scenario();
    env.write_context_file("bot_main.py", LONG_RUNNING_ENTRYPOINT);
    assert!(env.build(&[]).success);

    let pidfile = env.home().join("bot.pid");
    let berth = env.spawn_with_env(
        &["run", "bot", "--json"],
        &[("BOT_PIDFILE", pidfile.to_str().expect("utf-8 temp path"))],
    );

    let deadline = Instant::now() + Duration::from_secs(10);
    let child_pid = loop {
        let recorded = std::fs::read_to_string(&pidfile).unwrap_or_default();
        if let Ok(pid) = recorded.trim().parse::<i32>() {
            break pid;
        }
        assert!(Instant::now() < deadline, "unit never started");
        std::thread::sleep(Duration::from_millis(50));
    };

    kill(Pid::from_raw(berth.id() as i32), Signal::SIGTERM).unwrap();
    let result = TestEnv::finish(berth);

    assert_eq!(result.exit_code, 128 + 15, "{}", result.combined_output());
    assert_eq!(transitions(&result), ["STARTING", "RUNNING", "CRASHED"]);
    assert!(
        kill(Pid::from_raw(child_pid), None::<Signal>).is_err(),
        "unit {child_pid} outlived berth"
    );
}
