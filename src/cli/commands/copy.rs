//! `passvault copy`: put an entry's password on the clipboard, then clear it.

use std::time::Duration;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;

/// Execute the `copy` command.
///
/// Blocks until the clipboard has been cleared so the process does not
/// exit with the password still on it.
pub fn execute(cli: &Cli, query: &str, clear_after: Option<u64>) -> Result<()> {
    let ctx = Context::load(cli)?;
    ctx.unlock()?;

    let summary = ctx.resolve(query)?;
    let delay = clear_after
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.service.clipboard().delay());

    if clear_after.is_some() {
        let entry = ctx.service.read_entry(&ctx.vault_path, summary.id)?;
        ctx.service.clipboard().copy_with_auto_clear(&entry.password, delay)?;
    } else {
        ctx.service.copy_entry_password(&ctx.vault_path, summary.id)?;
    }

    // Lock now; the clipboard guard does not need the session.
    ctx.service.lock_vault();
    crate::audit::log_audit(&ctx.vault_path, "copy", Some(summary.id), None);

    output::success(&format!("Password for '{}' copied", summary.title));
    output::info(&format!(
        "Clipboard clears in {}s. Keep this terminal open until then.",
        delay.as_secs()
    ));

    ctx.service.clipboard().wait();
    output::info("Clipboard cleared.");

    Ok(())
}
