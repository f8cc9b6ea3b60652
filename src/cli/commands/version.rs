//! `passvault version`: print the version and on-disk format.

use console::style;

use crate::errors::Result;
use crate::vault::format::CURRENT_VERSION;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("passvault {}", env!("CARGO_PKG_VERSION"));
    println!(
        "{}",
        style(format!("vault format v{CURRENT_VERSION}")).dim()
    );
    Ok(())
}
