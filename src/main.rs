use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::Parser;

use symlink_garden::cli::{self, Command};
use symlink_garden::commands::{self, CommandContext};
use symlink_garden::logging;

static CANCELLED: AtomicBool = AtomicBool::new(false);

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    let command = args.command.name();

    logging::init_subscriber(args.global.verbose, command);
    let log = logging::Logger::new(command);

    if let Err(e) = ctrlc::set_handler(|| CANCELLED.store(true, Ordering::SeqCst)) {
        log.debug(&format!("cannot install Ctrl-C handler: {e}"));
    }

    let ctx = CommandContext {
        global: &args.global,
        log: &log,
        cancel: &CANCELLED,
        command,
    };

    match &args.command {
        Command::Prepare(opts) => commands::tend::run_prepare(&ctx, opts),
        Command::Tend => commands::tend::run(&ctx),
        Command::Plant(opts) => commands::plant::run(&ctx, opts),
        Command::Cultivate(opts) => commands::cultivate::run(&ctx, opts),
        Command::Fallow(opts) => commands::cultivate::run_fallow(&ctx, opts),
        Command::Prune(opts) => commands::plant::run_prune(&ctx, opts),
        Command::Arrange(opts) => commands::plant::run_arrange(&ctx, opts),
        Command::Packages => commands::packages::run(&ctx),
    }
}
