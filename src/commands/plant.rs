use anyhow::Result;

use super::{CommandContext, plan_and_run};
use crate::cli::{ArrangeOpts, PackageSpec, PlantOpts, PruneOpts};
use crate::error::GardenError;
use crate::garden::Package;

/// Run the `plant` command.
///
/// # Errors
///
/// Returns an error if a package cannot be loaded, or if planning or
/// execution fails.
pub fn run(ctx: &CommandContext<'_>, opts: &PlantOpts) -> Result<()> {
    let garden = ctx.find_garden()?;
    let packages = opts
        .packages
        .iter()
        .map(load_package)
        .collect::<Result<Vec<_>, _>>()?;
    for package in &packages {
        ctx.log.debug(&format!(
            "package {}: {}",
            package.name(),
            package.root().display()
        ));
    }
    let options = ctx.global.tend_options();
    plan_and_run(ctx, garden, |g| g.plant(packages, opts.replace, options))
}

/// Run the `prune` command.
///
/// # Errors
///
/// Returns an error if a name is not planted, or if planning or execution
/// fails.
pub fn run_prune(ctx: &CommandContext<'_>, opts: &PruneOpts) -> Result<()> {
    let garden = ctx.find_garden()?;
    let options = ctx.global.tend_options();
    plan_and_run(ctx, garden, |g| g.prune(&opts.names, options))
}

/// Run the `arrange` command.
///
/// # Errors
///
/// Returns an error if the name is not planted, or if planning or
/// execution fails.
pub fn run_arrange(ctx: &CommandContext<'_>, opts: &ArrangeOpts) -> Result<()> {
    let garden = ctx.find_garden()?;
    let options = ctx.global.tend_options();
    plan_and_run(ctx, garden, |g| g.arrange(&opts.name, opts.front, options))
}

fn load_package(spec: &PackageSpec) -> Result<Package, GardenError> {
    match &spec.name {
        Some(name) => Package::load(name.as_str(), &spec.path),
        None => Package::from_path(&spec.path),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn explicit_name_overrides_directory_name() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = PackageSpec {
            name: Some("dots".to_string()),
            path: tmp.path().to_path_buf(),
        };
        assert_eq!(load_package(&spec).unwrap().name(), "dots");
    }

    #[test]
    fn directory_name_is_the_default() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("tools");
        std::fs::create_dir(&dir).unwrap();
        let spec = PackageSpec {
            name: None,
            path: dir,
        };
        assert_eq!(load_package(&spec).unwrap().name(), "tools");
    }
}
