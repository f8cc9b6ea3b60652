//! `passvault passwd`: change the master password.
//!
//! Every entry is re-sealed under the new key and the vault file is
//! replaced in one atomic write.

use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, Context, NEW_PASSWORD_ENV};
use crate::errors::Result;

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    ctx.unlock()?;

    // The session already holds the key, but the old password is checked
    // again so an unattended terminal cannot change it.
    let old_password = crate::cli::prompt_password()?;

    output::info("Choose the new master password.");
    let new_password = prompt_new_password(NEW_PASSWORD_ENV)?;

    ctx.service
        .change_master_password(&old_password, &new_password)?;

    crate::audit::log_audit(&ctx.vault_path, "passwd", None, Some("master password changed"));
    output::success("Master password changed.");
    output::tip("Old backups of the vault file still open with the old password.");

    Ok(())
}
