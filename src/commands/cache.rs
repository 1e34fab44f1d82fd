use anyhow::Result;
use berth::presentation::factory;
use berth::presentation::output::{render_cache_list, render_prune};

use super::CommandContext;

pub fn cmd_cache_ls(ctx: &CommandContext) -> Result<i32> {
    let listings = factory::create_cache_use_case(&ctx.settings).list()?;
    render_cache_list(&mut std::io::stdout().lock(), &listings, ctx.format)?;
    Ok(0)
}

pub fn cmd_cache_prune(ctx: &CommandContext, dry_run: bool) -> Result<i32> {
    let result = factory::create_cache_use_case(&ctx.settings).prune(dry_run)?;
    render_prune(&mut std::io::stdout().lock(), &result, ctx.format)?;
    Ok(0)
}
