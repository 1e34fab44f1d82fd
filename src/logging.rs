//! Diagnostic logging
//!
//! `tracing` output goes to stderr so stdout stays reserved for command
//! output (and for the child process in `berth run`). `BERTH_LOG` takes an
//! `EnvFilter` directive; without it the level follows `-v`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive (e.g. `berth=debug`)
pub const LOG_ENV: &str = "BERTH_LOG";

/// Default level for a `-v` count.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: u8, ansi: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(verbose >= 2)
        .try_init();
}
