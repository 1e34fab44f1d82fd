use anyhow::Result;
use berth::presentation::output::render_version;
use berth::presentation::OutputFormat;

pub fn cmd_version(format: OutputFormat) -> Result<i32> {
    render_version(&mut std::io::stdout().lock(), format)?;
    Ok(0)
}
