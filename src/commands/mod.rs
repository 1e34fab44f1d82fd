//! Command handlers
//!
//! Each handler returns the process exit code. Errors that abort a command
//! before it produced a result bubble up as `anyhow::Error`.

mod build;
mod cache;
mod images;
mod run;
mod version;

use std::io::{self, Write};

use anyhow::Result;
use berth::config::{self, CliOverrides, ConfigWarning, Settings};
use berth::error::BerthError;
use berth::presentation::OutputFormat;

use crate::cli::{CacheCommands, Cli, Commands};

/// What every handler needs from the command line and config
pub struct CommandContext {
    pub settings: Settings,
    pub format: OutputFormat,
    pub verbose: u8,
}

impl CommandContext {
    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn dispatch(cli: Cli) -> Result<i32> {
    let format = OutputFormat::from_json_flag(cli.json);
    if let Commands::Version = cli.command {
        return version::cmd_version(format);
    }

    let overrides = CliOverrides {
        store: cli.store,
        bases: cli.bases,
        index: cli.index,
        no_cache: matches!(cli.command, Commands::Build { no_cache: true, .. }),
    };
    let (settings, warnings) = config::load_settings(&overrides)?;
    print_config_warnings(&warnings, format);

    let ctx = CommandContext {
        settings,
        format,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Build {
            context,
            tag,
            recipe,
            no_cache: _,
        } => build::cmd_build(&ctx, &context, tag.as_deref(), recipe),
        Commands::Run { tag } => run::cmd_run(&ctx, &tag),
        Commands::Inspect { tag } => images::cmd_inspect(&ctx, &tag),
        Commands::Images => images::cmd_images(&ctx),
        Commands::Cache { command } => match command {
            CacheCommands::Ls => cache::cmd_cache_ls(&ctx),
            CacheCommands::Prune { dry_run } => cache::cmd_cache_prune(&ctx, dry_run),
        },
        Commands::Version => version::cmd_version(format),
    }
}

fn print_config_warnings(warnings: &[ConfigWarning], format: OutputFormat) {
    for warning in warnings {
        match format {
            OutputFormat::Json => {
                let _ = write_json_line(
                    &mut io::stderr().lock(),
                    &serde_json::json!({ "event": "warning", "message": warning.to_string() }),
                );
            }
            OutputFormat::Text => eprintln!("warning: {}", warning),
        }
    }
}

/// Report a command failure: a JSON `error` event on stdout, or a
/// plain message on stderr.
pub fn report_error(format: OutputFormat, stage: Option<&str>, error: &BerthError, message: &str) {
    match format {
        OutputFormat::Json => {
            let _ = write_json_line(
                &mut io::stdout().lock(),
                &serde_json::json!({
                    "event": "error",
                    "stage": stage,
                    "kind": error.kind(),
                    "message": message,
                }),
            );
        }
        OutputFormat::Text => eprintln!("Error: {}", message),
    }
}

fn write_json_line(out: &mut impl Write, value: &serde_json::Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}
