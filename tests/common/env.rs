//! Test environment builder for isolated berth testing.
//!
//! `TestEnv` points `BERTH_TEST_HOME` at a temp directory, so the default
//! `~/.berth/{store,bases,index}` locations all live inside it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use tempfile::TempDir;

use super::fixtures::{FAKE_PYTHON, SCENARIO_ENTRYPOINT, SCENARIO_MANIFEST, SCENARIO_RECIPE};

/// Variables from the developer's shell that would leak into a run
const SCRUBBED_ENV: &[&str] = &[
    "BERTH_STORE",
    "BERTH_BASES",
    "BERTH_INDEX",
    "BERTH_NO_CACHE",
    "BERTH_COLOR",
    "BERTH_LOG",
];

/// Result of running a berth CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Parse each stdout line as a JSON event
    pub fn stdout_events(&self) -> Vec<serde_json::Value> {
        parse_ndjson(&self.stdout)
    }

    /// Parse each stderr line that is a JSON object
    pub fn stderr_events(&self) -> Vec<serde_json::Value> {
        parse_ndjson(&self.stderr)
    }
}

fn parse_ndjson(text: &str) -> Vec<serde_json::Value> {
    text.lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| {
            serde_json::from_str(line).unwrap_or_else(|e| panic!("bad JSON line {line:?}: {e}"))
        })
        .collect()
}

/// Isolated environment with a home directory and one build context.
pub struct TestEnv {
    root: TempDir,
    berth_bin: PathBuf,
}

impl TestEnv {
    /// Empty environment: no bases, no index, no context.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(root.path().join("home")).expect("Failed to create home");
        Self {
            root,
            berth_bin: PathBuf::from(env!("CARGO_BIN_EXE_berth")),
        }
    }

    /// Environment holding base 3.11, a small index and the bot context.
    pub fn with_bot_scenario() -> Self {
        let env = Self::new();
        env.add_base("3.11");
        env.publish("requests", "2.31.0", &["idna>=2.5", "certifi"]);
        env.publish("requests", "2.30.0", &[]);
        env.publish("idna", "3.6", &[]);
        env.publish("certifi", "2024.2.2", &[]);
        env.write_context_file("berth.toml", SCENARIO_RECIPE);
        env.write_context_file("requirements.txt", SCENARIO_MANIFEST);
        env.write_context_file("bot_main.py", SCENARIO_ENTRYPOINT);
        env
    }

    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    pub fn store(&self) -> PathBuf {
        self.home().join(".berth/store")
    }

    pub fn bases(&self) -> PathBuf {
        self.home().join(".berth/bases")
    }

    pub fn index(&self) -> PathBuf {
        self.home().join(".berth/index")
    }

    /// The build context directory (`<root>/bot`)
    pub fn context(&self) -> PathBuf {
        self.root.path().join("bot")
    }

    /// Install a base whose `python` runs its script argument with `/bin/sh`.
    pub fn add_base(&self, version: &str) {
        let bin = self.bases().join(version).join("rootfs/usr/bin");
        fs::create_dir_all(&bin).expect("Failed to create base");
        write_executable(&bin.join("python"), FAKE_PYTHON);
    }

    /// Add a package to the local index.
    pub fn publish(&self, name: &str, version: &str, requires: &[&str]) {
        let dir = self.index().join(name).join(version);
        let files = dir.join("files").join(name);
        fs::create_dir_all(&files).expect("Failed to create package");
        fs::write(files.join("__init__.py"), format!("__version__ = '{version}'\n"))
            .expect("Failed to write package");
        if !requires.is_empty() {
            fs::write(dir.join("requires.txt"), requires.join("\n") + "\n")
                .expect("Failed to write requires");
        }
    }

    pub fn write_context_file(&self, relative: &str, content: &str) {
        let path = self.context().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directories");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    pub fn remove_context_file(&self, relative: &str) {
        fs::remove_file(self.context().join(relative)).expect("Failed to remove file");
    }

    /// Write the user config file (`~/.config/berth/config.toml`).
    pub fn write_user_config(&self, content: &str) {
        let dir = self.home().join(".config/berth");
        fs::create_dir_all(&dir).expect("Failed to create config dir");
        fs::write(dir.join("config.toml"), content).expect("Failed to write config");
    }

    /// Run berth from the root of the environment.
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        self.run_from_with_env(self.root.path(), args, env_vars)
    }

    pub fn run_from_with_env(
        &self,
        cwd: &Path,
        args: &[&str],
        env_vars: &[(&str, &str)],
    ) -> TestResult {
        let output = self
            .command(cwd, args, env_vars)
            .output()
            .expect("Failed to execute berth");
        output_to_result(output)
    }

    /// Start berth without waiting for it; stdout and stderr are piped.
    pub fn spawn_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> Child {
        self.command(self.root.path(), args, env_vars)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start berth")
    }

    /// Collect the result of a berth started with `spawn_with_env`.
    pub fn finish(child: Child) -> TestResult {
        output_to_result(child.wait_with_output().expect("Failed to wait for berth"))
    }

    fn command(&self, cwd: &Path, args: &[&str], env_vars: &[(&str, &str)]) -> Command {
        let mut cmd = Command::new(&self.berth_bin);
        cmd.current_dir(cwd)
            .args(args)
            .env("BERTH_TEST_HOME", self.home())
            .env("HOME", self.home());
        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        for (key, value) in env_vars {
            cmd.env(key, value);
        }
        cmd
    }

    /// `berth build <context>` with extra flags
    pub fn build(&self, extra: &[&str]) -> TestResult {
        let context = self.context();
        let mut args = vec!["build", context.to_str().expect("utf-8 temp path")];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn output_to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write executable");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod executable");
    }
}
