use anyhow::Result;

use super::{CommandContext, plan_and_run};
use crate::cli::{CultivateOpts, FallowOpts};

/// Run the `cultivate` command.
///
/// # Errors
///
/// Returns an error if the package is not planted, a file cannot be
/// cultivated, or execution fails.
pub fn run(ctx: &CommandContext<'_>, opts: &CultivateOpts) -> Result<()> {
    let garden = ctx.find_garden()?;
    let options = ctx.global.tend_options();
    plan_and_run(ctx, garden, |g| {
        g.cultivate(&opts.package, &opts.files, options)
    })
}

/// Run the `fallow` command.
///
/// # Errors
///
/// Returns an error if a file cannot be fallowed or execution fails.
pub fn run_fallow(ctx: &CommandContext<'_>, opts: &FallowOpts) -> Result<()> {
    let garden = ctx.find_garden()?;
    let options = ctx.global.tend_options();
    plan_and_run(ctx, garden, |g| g.fallow(&opts.files, options))
}
