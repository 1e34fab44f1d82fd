//! berth CLI - staged runtime-image builder and single-process launcher
//!
//! Usage: berth <COMMAND>
//!
//! Commands:
//!   build    Build an image from a build context
//!   run      Start a tagged image and wait for its process
//!   inspect  Show the metadata of a tagged image
//!   images   List tagged images
//!   cache    Manage the stage cache

mod cli;
mod commands;

use clap::Parser;
use is_terminal::IsTerminal;

use berth::error::BerthError;
use berth::presentation::OutputFormat;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    berth::logging::init(cli.verbose, std::io::stderr().is_terminal());

    let format = OutputFormat::from_json_flag(cli.json);
    let code = match commands::dispatch(cli) {
        Ok(code) => code,
        Err(error) => {
            report_fatal(format, &error);
            1
        }
    };
    std::process::exit(code);
}

fn report_fatal(format: OutputFormat, error: &anyhow::Error) {
    match error.downcast_ref::<BerthError>() {
        Some(berth_error) => {
            commands::report_error(format, None, berth_error, &format!("{:#}", error))
        }
        None => match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "event": "error", "kind": "internal", "message": format!("{:#}", error) })
            ),
            OutputFormat::Text => eprintln!("Error: {:#}", error),
        },
    }
}
