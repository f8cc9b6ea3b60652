//! `passvault init`: create a new, empty vault.

use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, Context, PASSWORD_ENV};
use crate::errors::{PassVaultError, Result};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let path = &ctx.vault_path;

    // Refuse early so the user is not asked for a password for nothing.
    if path.exists() {
        output::tip("Use `passvault add` to add entries to the existing vault.");
        return Err(PassVaultError::PathExists(path.clone()));
    }

    let password = prompt_new_password(PASSWORD_ENV)?;
    ctx.service.create_vault(path, &password)?;

    crate::audit::log_audit(path, "init", None, Some("vault created"));

    output::success(&format!("Vault created at {}", path.display()));
    output::tip("Run `passvault add <TITLE>` to add an entry.");
    output::tip("Run `passvault generate` to create a strong password.");

    Ok(())
}
