//! `passvault add`: add an entry to the vault.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{read_entry_password, Cli, Context};
use crate::errors::Result;

/// Execute the `add` command.
pub fn execute(cli: &Cli, title: &str, username: &str, generate: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;

    // Generate or collect the password before unlocking so a slow prompt
    // does not eat into the session's idle time.
    let password = match generate {
        Some(preset) => Zeroizing::new(ctx.service.generate_password_preset(preset)?),
        None => read_entry_password(&format!("Password for {title}"))?,
    };

    ctx.unlock()?;
    let id = ctx
        .service
        .create_entry(&ctx.vault_path, title, username, &password)?;

    crate::audit::log_audit(&ctx.vault_path, "add", Some(id), None);

    output::success(&format!("Entry '{title}' added ({id})"));
    if generate.is_some() {
        output::tip("Run `passvault copy <TITLE>` to copy the generated password.");
    }

    Ok(())
}
