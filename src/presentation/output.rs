//! Output Rendering
//!
//! Renders command results to stdout, as aligned text or as one JSON
//! document per command.

use std::io::{self, Write};

use serde_json::json;

use crate::application::{BuildResult, CacheListing, PruneResult, RunOutcome};
use crate::domain::ports::StoredImage;

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn write_json(out: &mut impl Write, value: &serde_json::Value) -> io::Result<()> {
    let line = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")
}

/// Final line of a successful build: `<tag> <digest>`.
///
/// In JSON mode the event stream already carried the result.
pub fn render_build(out: &mut impl Write, result: &BuildResult, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => Ok(()),
        OutputFormat::Text => writeln!(out, "{} {}", result.tag(), result.digest()),
    }
}

pub fn render_images(out: &mut impl Write, images: &[StoredImage], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = images
                .iter()
                .map(|image| {
                    let m = &image.metadata;
                    json!({
                        "tag": m.tag,
                        "digest": m.digest.as_str(),
                        "base": m.base_version,
                        "built_at": m.built_at.to_rfc3339(),
                        "packages": m.packages.len(),
                    })
                })
                .collect();
            write_json(out, &json!({ "images": rows }))
        }
        OutputFormat::Text => {
            if images.is_empty() {
                return writeln!(out, "No images.");
            }
            let width = images
                .iter()
                .map(|i| i.metadata.tag.len())
                .max()
                .unwrap_or(0)
                .max("TAG".len());
            writeln!(out, "{:<width$}  {:<12}  {:<8}  BUILT", "TAG", "DIGEST", "BASE")?;
            for image in images {
                let m = &image.metadata;
                writeln!(
                    out,
                    "{:<width$}  {:<12}  {:<8}  {}",
                    m.tag,
                    m.digest.short(),
                    m.base_version,
                    m.built_at.format("%Y-%m-%d %H:%M:%S")
                )?;
            }
            Ok(())
        }
    }
}

pub fn render_inspect(out: &mut impl Write, image: &StoredImage, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&image.metadata)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            if let Some(object) = value.as_object_mut() {
                object.insert(
                    "rootfs".to_string(),
                    json!(image.rootfs.display().to_string()),
                );
            }
            write_json(out, &value)
        }
        OutputFormat::Text => {
            let metadata = toml::to_string_pretty(&image.metadata)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(out, "# rootfs: {}", image.rootfs.display())?;
            out.write_all(metadata.as_bytes())
        }
    }
}

pub fn render_cache_list(
    out: &mut impl Write,
    listings: &[CacheListing],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = listings
                .iter()
                .map(|l| {
                    json!({
                        "stage": l.entry.key.stage().as_str(),
                        "key": l.entry.key.key().as_str(),
                        "parent": l.entry.key.parent().map(|p| p.as_str()),
                        "created_at": l.entry.created_at.to_rfc3339(),
                        "referenced_by": l.referenced_by,
                    })
                })
                .collect();
            write_json(out, &json!({ "entries": rows }))
        }
        OutputFormat::Text => {
            if listings.is_empty() {
                return writeln!(out, "Stage cache is empty.");
            }
            writeln!(out, "{:<12}  {:<12}  {:<19}  USED BY", "STAGE", "KEY", "CREATED")?;
            for l in listings {
                let used_by = if l.is_referenced() {
                    l.referenced_by.join(", ")
                } else {
                    "-".to_string()
                };
                writeln!(
                    out,
                    "{:<12}  {:<12}  {:<19}  {}",
                    l.entry.key.stage(),
                    l.entry.key.key().short(),
                    l.entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    used_by
                )?;
            }
            Ok(())
        }
    }
}

pub fn render_prune(out: &mut impl Write, result: &PruneResult, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let removed: Vec<serde_json::Value> = result
                .removed
                .iter()
                .map(|e| json!({ "stage": e.key.stage().as_str(), "key": e.key.key().as_str() }))
                .collect();
            write_json(
                out,
                &json!({ "dry_run": result.dry_run, "removed": removed, "kept": result.kept }),
            )
        }
        OutputFormat::Text => {
            let verb = if result.dry_run { "Would remove" } else { "Removed" };
            for entry in &result.removed {
                writeln!(out, "{} {}", verb, entry.key)?;
            }
            writeln!(
                out,
                "{} {} entries, kept {}",
                verb,
                result.removed.len(),
                result.kept
            )
        }
    }
}

/// JSON summary of a finished unit. Text mode prints nothing: stdout
/// belongs to the child.
pub fn render_run(out: &mut impl Write, outcome: &RunOutcome, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => Ok(()),
        OutputFormat::Json => {
            let history: Vec<String> = outcome.unit.history().iter().map(|s| s.to_string()).collect();
            write_json(
                out,
                &json!({
                    "event": "unit_finished",
                    "image": outcome.unit.image(),
                    "state": outcome.unit.state().name(),
                    "exit_code": outcome.exit_code,
                    "history": history,
                }),
            )
        }
    }
}

pub fn render_version(out: &mut impl Write, format: OutputFormat) -> io::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    match format {
        OutputFormat::Json => write_json(out, &json!({ "name": "berth", "version": version })),
        OutputFormat::Text => writeln!(out, "berth {}", version),
    }
}
