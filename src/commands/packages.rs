use anyhow::Result;

use super::CommandContext;

/// Run the `packages` command: print planted package names, lowest
/// precedence first.  Takes no lock and never mutates the garden.
///
/// # Errors
///
/// Returns an error if no garden is found or its manifest is invalid.
#[allow(clippy::print_stdout)]
pub fn run(ctx: &CommandContext<'_>) -> Result<()> {
    let garden = ctx.find_garden()?;
    for name in garden.package_names() {
        println!("{name}");
    }
    Ok(())
}
