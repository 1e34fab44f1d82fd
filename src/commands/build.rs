use std::path::{Path, PathBuf};

use anyhow::Result;
use berth::application::BuildOptions;
use berth::domain::value_objects::ImageTag;
use berth::presentation::factory::{self, EventTarget};
use berth::presentation::output::render_build;

use super::{report_error, CommandContext};

pub fn cmd_build(
    ctx: &CommandContext,
    context: &Path,
    tag: Option<&str>,
    recipe: Option<PathBuf>,
) -> Result<i32> {
    let mut options = BuildOptions::new(context).with_no_cache(ctx.settings.no_cache);
    if let Some(tag) = tag {
        options = options.with_tag(ImageTag::parse(tag)?);
    }
    if let Some(recipe) = recipe {
        options = options.with_recipe(recipe);
    }

    let target = if ctx.json() {
        EventTarget::JsonStdout
    } else {
        EventTarget::Console
    };
    let sink = factory::create_event_sink(target, &ctx.settings, ctx.verbose);
    let use_case = factory::create_build_use_case(&ctx.settings);

    match use_case.execute_with_events(&options, sink) {
        Ok(result) => {
            render_build(&mut std::io::stdout().lock(), &result, ctx.format)?;
            Ok(0)
        }
        Err(failure) => {
            let stage = failure.stage.map(|s| s.as_str());
            report_error(ctx.format, stage, &failure.error, &failure.to_string());
            Ok(1)
        }
    }
}
