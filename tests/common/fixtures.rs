//! Test fixtures - reusable content constants for tests.

/// Stand-in interpreter: runs its script argument with `/bin/sh`, so
/// entrypoints below are shell scripts that happen to end in `.py`.
pub const FAKE_PYTHON: &str = "#!/bin/sh\nexec /bin/sh \"$@\"\n";

/// Recipe of the chat bot scenario
pub const SCENARIO_RECIPE: &str = r#"
[base]
version = "3.11"

[dependencies]
manifest = "requirements.txt"

[artifact]
sources = ["bot_main.py"]
workdir = "/app"

[launch]
command = ["python", "bot_main.py"]
"#;

pub const SCENARIO_MANIFEST: &str = "requests==2.31.0\n";

/// Entrypoint that prints from its working directory and exits cleanly
pub const SCENARIO_ENTRYPOINT: &str = "echo \"bot online in $(pwd)\"\nexit 0\n";

/// Entrypoint exiting with a status taken from `BOT_EXIT` (default 0)
pub const EXIT_CODE_ENTRYPOINT: &str = "echo \"exiting with ${BOT_EXIT:-0}\"\nexit ${BOT_EXIT:-0}\n";

/// Entrypoint that lists the installed packages it can see
pub const IMPORT_CHECK_ENTRYPOINT: &str = "ls \"$BOT_SITE\"\n";

/// Entrypoint that records its pid in `BOT_PIDFILE` and then idles
pub const LONG_RUNNING_ENTRYPOINT: &str = "echo $$ > \"$BOT_PIDFILE\"\nexec sleep 60\n";
