use anyhow::Result;
use berth::domain::ports::ImageStore;
use berth::domain::value_objects::ImageTag;
use berth::presentation::factory;
use berth::presentation::output::{render_images, render_inspect};

use super::{report_error, CommandContext};

pub fn cmd_images(ctx: &CommandContext) -> Result<i32> {
    let images = factory::create_image_store(&ctx.settings).list()?;
    render_images(&mut std::io::stdout().lock(), &images, ctx.format)?;
    Ok(0)
}

pub fn cmd_inspect(ctx: &CommandContext, tag: &str) -> Result<i32> {
    let tag = ImageTag::parse(tag)?;
    match factory::create_image_store(&ctx.settings).load(&tag) {
        Ok(image) => {
            render_inspect(&mut std::io::stdout().lock(), &image, ctx.format)?;
            Ok(0)
        }
        Err(error) => {
            report_error(ctx.format, None, &error, &error.to_string());
            Ok(1)
        }
    }
}
