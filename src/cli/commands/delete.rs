//! `passvault delete`: remove an entry from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{PassVaultError, Result};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, query: &str, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    ctx.unlock()?;

    let summary = ctx.resolve(query)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete entry '{}'?", summary.title))
            .default(false)
            .interact()
            .map_err(|e| PassVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    if !ctx.service.delete_entry(&ctx.vault_path, summary.id)? {
        return Err(PassVaultError::NotFound(summary.id));
    }

    crate::audit::log_audit(&ctx.vault_path, "delete", Some(summary.id), None);
    output::success(&format!("Deleted entry '{}'", summary.title));

    Ok(())
}
