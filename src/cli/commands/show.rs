//! `passvault show`: print one entry.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, query: &str, reveal: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    ctx.unlock()?;

    let summary = ctx.resolve(query)?;
    let entry = ctx.service.read_entry(&ctx.vault_path, summary.id)?;

    output::print_entry(&entry, reveal);
    if !reveal {
        output::tip("Use --reveal to print the password, or `passvault copy` to copy it.");
    }

    Ok(())
}
