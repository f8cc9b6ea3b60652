//! `passvault list`: display all entry titles in a table.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    ctx.unlock()?;

    let entries = ctx.service.list_entries(&ctx.vault_path)?;

    output::info(&format!(
        "{} ({} entr{})",
        ctx.vault_path.display(),
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" }
    ));
    output::print_entries_table(&entries);

    Ok(())
}
