pub mod cultivate;
pub mod packages;
pub mod plant;
pub mod tend;

use std::sync::atomic::AtomicBool;

use anyhow::Result;

use crate::actions::Plan;
use crate::cli::GlobalOpts;
use crate::error::GardenError;
use crate::garden::Garden;
use crate::lock::GardenLock;
use crate::logging::Logger;
use crate::runner;

/// Shared state every subcommand runs with.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// Global CLI flags.
    pub global: &'a GlobalOpts,
    /// Console and file logger.
    pub log: &'a Logger,
    /// Set by the Ctrl-C handler.
    pub cancel: &'a AtomicBool,
    /// Subcommand name, recorded in the lock file.
    pub command: &'static str,
}

impl CommandContext<'_> {
    /// Open the nearest garden at or above `--garden`.
    ///
    /// # Errors
    ///
    /// Returns an error if no garden is found or its manifest is invalid.
    pub fn find_garden(&self) -> Result<Garden> {
        let garden = Garden::find(&self.global.garden)?;
        self.log
            .debug(&format!("garden: {}", garden.root().display()));
        Ok(garden)
    }
}

/// Plan with `plan_with` under the garden lock, then either describe the
/// plan (`--dry`) or execute it.
///
/// A garden without a shed is planned unlocked and locked only just before
/// execution, so a dry run never creates the shed.  The summary is printed
/// after verbose or failed runs.
///
/// # Errors
///
/// Returns an error if the lock is held elsewhere, planning fails, or an
/// action fails or is interrupted.
pub fn plan_and_run<F>(ctx: &CommandContext<'_>, mut garden: Garden, plan_with: F) -> Result<()>
where
    F: FnOnce(&mut Garden) -> Result<Plan, GardenError>,
{
    let mut lock = if garden.is_prepared() {
        Some(acquire_lock(ctx, &garden)?)
    } else {
        None
    };

    let plan = plan_with(&mut garden)?;
    ctx.log
        .debug(&format!("planned {} action(s)", plan.len()));

    if ctx.global.dry {
        runner::dry_run(&plan, ctx.log);
        if ctx.global.verbose {
            ctx.log.print_summary();
        }
        return Ok(());
    }

    if lock.is_none() && !plan.is_empty() {
        lock = Some(acquire_lock(ctx, &garden)?);
    }

    let result = runner::execute(&plan, ctx.log, ctx.global.verbose, ctx.cancel);
    if ctx.global.verbose || result.is_err() {
        ctx.log.print_summary();
    }
    drop(lock);
    result?;
    Ok(())
}

fn acquire_lock(ctx: &CommandContext<'_>, garden: &Garden) -> Result<GardenLock> {
    let lock = GardenLock::acquire(&garden.lock_path(), ctx.command)?;
    ctx.log
        .debug(&format!("acquired lock: {}", lock.path().display()));
    Ok(lock)
}
