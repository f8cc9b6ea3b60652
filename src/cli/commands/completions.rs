//! `passvault completions`: print a shell completion script.
//!
//! Usage:
//!   passvault completions bash > ~/.bash_completion.d/passvault
//!   passvault completions zsh

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_mentions_every_subcommand() {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        generate(Shell::Bash, &mut cmd, "passvault", &mut buf);
        let script = String::from_utf8(buf).unwrap();
        for sub in ["init", "list", "show", "add", "copy", "generate", "passwd"] {
            assert!(script.contains(sub), "missing {sub}");
        }
    }
}
