use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use crate::garden::{TendOptions, WeedStrategy};

/// Top-level CLI entry point for the symlink garden.
#[derive(Parser, Debug)]
#[command(
    name = "garden",
    about = "Declarative symlink farm manager",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Garden directory (searched upwards for an existing garden)
    #[arg(short, long, global = true, default_value = ".")]
    pub garden: PathBuf,

    /// What to do with files in the garden that no package owns
    #[arg(long, global = true, value_enum, default_value_t = WeedStrategy::Fail)]
    pub weeds: WeedStrategy,

    /// Let higher-precedence packages shadow lower ones (default)
    #[arg(long, global = true, overrides_with = "no_shadow")]
    pub shadow: bool,

    /// Fail instead of shadowing a path another package provides
    #[arg(long, global = true, overrides_with = "shadow")]
    pub no_shadow: bool,

    /// Print the planned actions without applying them
    #[arg(short = 'd', long, global = true)]
    pub dry: bool,

    /// Print each action as it is applied
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalOpts {
    /// Planning options selected by the flags.
    #[must_use]
    pub const fn tend_options(&self) -> TendOptions {
        TendOptions {
            weeds: self.weeds,
            no_shadow: self.no_shadow,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a garden in the given directory
    Prepare(PrepareOpts),
    /// Bring the garden's links in line with its packages
    Tend,
    /// Add packages to the garden
    Plant(PlantOpts),
    /// Move garden files into a package and link them back
    Cultivate(CultivateOpts),
    /// Move package files back into the garden
    Fallow(FallowOpts),
    /// Remove packages and their links from the garden
    Prune(PruneOpts),
    /// Move a package to the front or back of the precedence order
    Arrange(ArrangeOpts),
    /// List planted packages, lowest precedence first
    Packages,
}

impl Command {
    /// Subcommand name, used for the log file and lock metadata.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Prepare(_) => "prepare",
            Self::Tend => "tend",
            Self::Plant(_) => "plant",
            Self::Cultivate(_) => "cultivate",
            Self::Fallow(_) => "fallow",
            Self::Prune(_) => "prune",
            Self::Arrange(_) => "arrange",
            Self::Packages => "packages",
        }
    }
}

/// Options for the `prepare` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PrepareOpts {
    /// Prune every package and start over
    #[arg(long)]
    pub reset: bool,
}

/// Options for the `plant` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PlantOpts {
    /// Replace packages that are already planted under the same name
    #[arg(long)]
    pub replace: bool,

    /// Package directories, optionally prefixed with `name:`
    #[arg(required = true, value_parser = parse_package_spec)]
    pub packages: Vec<PackageSpec>,
}

/// Options for the `cultivate` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CultivateOpts {
    /// Package that receives the files
    #[arg(short, long)]
    pub package: String,

    /// Garden files or directories to move
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Options for the `fallow` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct FallowOpts {
    /// Garden files or directories to restore
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Options for the `prune` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PruneOpts {
    /// Names of the packages to remove
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Options for the `arrange` subcommand.
#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("position").required(true).args(["front", "back"])))]
pub struct ArrangeOpts {
    /// Package to move
    pub name: String,

    /// Give the package the highest precedence
    #[arg(long)]
    pub front: bool,

    /// Give the package the lowest precedence
    #[arg(long)]
    pub back: bool,
}

/// A package argument: a directory with an optional explicit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Explicit name, if given as `name:path`.
    pub name: Option<String>,
    /// Package directory.
    pub path: PathBuf,
}

/// Parse `[name:]path`.
///
/// A prefix is only taken as a name if it is non-empty and contains no path
/// separator, so `./a:b` is a path.  On Windows a single-letter prefix is a
/// drive letter.
fn parse_package_spec(arg: &str) -> Result<PackageSpec, String> {
    if arg.is_empty() {
        return Err("package path must not be empty".to_string());
    }
    if let Some((name, path)) = arg.split_once(':')
        && !name.is_empty()
        && !name.contains(['/', '\\'])
        && !(cfg!(windows) && name.len() == 1)
    {
        if path.is_empty() {
            return Err(format!("missing package path after '{name}:'"));
        }
        return Ok(PackageSpec {
            name: Some(name.to_string()),
            path: PathBuf::from(path),
        });
    }
    Ok(PackageSpec {
        name: None,
        path: PathBuf::from(arg),
    })
}
