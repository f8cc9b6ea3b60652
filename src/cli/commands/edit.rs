//! `passvault edit`: change fields of an existing entry.

use crate::cli::output;
use crate::cli::{read_entry_password, Cli, Context};
use crate::errors::{PassVaultError, Result};
use crate::vault::EntryPatch;

/// Options collected from the command line.
pub struct EditArgs<'a> {
    pub query: &'a str,
    pub title: Option<&'a str>,
    pub username: Option<&'a str>,
    pub prompt_password: bool,
    pub generate: Option<&'a str>,
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, args: &EditArgs<'_>) -> Result<()> {
    let ctx = Context::load(cli)?;

    let password = match (args.generate, args.prompt_password) {
        (Some(preset), _) => Some(ctx.service.generate_password_preset(preset)?),
        (None, true) => Some(read_entry_password("New password")?.to_string()),
        (None, false) => None,
    };

    let patch = EntryPatch {
        title: args.title.map(str::to_string),
        username: args.username.map(str::to_string),
        password,
    };
    if patch.is_empty() {
        return Err(PassVaultError::CommandFailed(
            "nothing to change: pass --title, --username, --password or --generate".into(),
        ));
    }

    ctx.unlock()?;
    let summary = ctx.resolve(args.query)?;
    if !ctx.service.update_entry(&ctx.vault_path, summary.id, &patch)? {
        return Err(PassVaultError::NotFound(summary.id));
    }

    let changed: Vec<&str> = [
        ("title", patch.title.is_some()),
        ("username", patch.username.is_some()),
        ("password", patch.password.is_some()),
    ]
    .iter()
    .filter(|(_, set)| *set)
    .map(|(name, _)| *name)
    .collect();
    let details = changed.join(",");

    crate::audit::log_audit(&ctx.vault_path, "edit", Some(summary.id), Some(&details));
    output::success(&format!("Entry '{}' updated ({details})", summary.title));

    Ok(())
}
