use anyhow::Result;

use super::{CommandContext, plan_and_run};
use crate::cli::PrepareOpts;
use crate::garden::Garden;

/// Run the `prepare` command.
///
/// Unlike every other command this uses `--garden` as-is rather than
/// searching upwards, so a garden can be nested inside another.
///
/// # Errors
///
/// Returns an error if the garden already exists (without `--reset`), or
/// if planning or execution fails.
pub fn run_prepare(ctx: &CommandContext<'_>, opts: &PrepareOpts) -> Result<()> {
    let garden = Garden::open(&ctx.global.garden)?;
    let options = ctx.global.tend_options();
    plan_and_run(ctx, garden, |g| g.prepare(opts.reset, options))
}

/// Run the `tend` command.
///
/// # Errors
///
/// Returns an error if no garden is found, or if planning or execution
/// fails.
pub fn run(ctx: &CommandContext<'_>) -> Result<()> {
    let garden = ctx.find_garden()?;
    let options = ctx.global.tend_options();
    plan_and_run(ctx, garden, |g| g.tend(options))
}
