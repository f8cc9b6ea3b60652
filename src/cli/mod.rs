//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use zeroize::Zeroizing;

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::service::VaultService;
use crate::vault::{EntryId, EntrySummary};

/// Minimum master password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "PASSVAULT_PASSWORD";

/// Environment variable holding the new master password for `passwd`.
pub const NEW_PASSWORD_ENV: &str = "PASSVAULT_NEW_PASSWORD";

/// PassVault CLI: local encrypted password vault.
#[derive(Parser)]
#[command(name = "passvault", about = "Local encrypted password vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (overrides the config file)
    #[arg(long, global = true, env = "PASSVAULT_VAULT")]
    pub vault: Option<PathBuf>,

    /// Config file (default: ./passvault.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// List entry titles
    List,

    /// Show one entry (password hidden unless --reveal)
    Show {
        /// Entry id, unique id prefix, or exact title
        entry: String,
        /// Print the password too
        #[arg(long)]
        reveal: bool,
    },

    /// Add an entry
    Add {
        /// Display title (e.g. "Mail")
        title: String,
        /// Username or login
        #[arg(short, long, default_value = "")]
        username: String,
        /// Generate the password from this preset instead of prompting
        #[arg(short, long, value_name = "PRESET")]
        generate: Option<String>,
    },

    /// Change fields of an entry
    Edit {
        /// Entry id, unique id prefix, or exact title
        entry: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New username
        #[arg(short, long)]
        username: Option<String>,
        /// Prompt for a new password
        #[arg(short, long)]
        password: bool,
        /// Replace the password with one generated from this preset
        #[arg(short, long, value_name = "PRESET", conflicts_with = "password")]
        generate: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry id, unique id prefix, or exact title
        entry: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Copy an entry's password to the clipboard, clearing it after a delay
    Copy {
        /// Entry id, unique id prefix, or exact title
        entry: String,
        /// Seconds before the clipboard is cleared (default: from config)
        #[arg(long)]
        clear_after: Option<u64>,
    },

    /// Generate a password
    Generate(GenerateArgs),

    /// Change the vault's master password
    Passwd,

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Show version
    Version,
}

/// Options for `generate`.
#[derive(clap::Args)]
pub struct GenerateArgs {
    /// Named preset: safe, balanced, fast, pin (default: from config)
    #[arg(short, long, conflicts_with_all = ["length", "pronounceable"])]
    pub preset: Option<String>,

    /// Custom length; enables the custom policy flags below
    #[arg(short, long)]
    pub length: Option<usize>,

    /// Leave out uppercase letters
    #[arg(long, requires = "length")]
    pub no_upper: bool,

    /// Leave out lowercase letters
    #[arg(long, requires = "length")]
    pub no_lower: bool,

    /// Leave out digits
    #[arg(long, requires = "length")]
    pub no_digits: bool,

    /// Leave out symbols
    #[arg(long, requires = "length")]
    pub no_symbols: bool,

    /// Skip look-alike characters such as 0/O and 1/l/I
    #[arg(long, requires = "length")]
    pub exclude_ambiguous: bool,

    /// Include at least one character of every selected class
    #[arg(long, requires = "length")]
    pub require_each: bool,

    /// Generate a pronounceable password of this length
    #[arg(long, value_name = "LENGTH", conflicts_with = "length")]
    pub pronounceable: Option<usize>,

    /// How many passwords to print
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a command needs: settings, the vault path and a service.
pub struct Context {
    pub settings: Settings,
    pub vault_path: PathBuf,
    pub service: VaultService,
}

impl Context {
    /// Load settings (from `--config` or the working directory) and apply
    /// `--vault`.
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with_clipboard(cli, Arc::new(SystemClipboard::new()))
    }

    pub fn load_with_clipboard(cli: &Cli, clipboard: Arc<dyn Clipboard>) -> Result<Self> {
        let settings = match &cli.config {
            Some(path) => Settings::load_file(path)?,
            None => Settings::load(&std::env::current_dir()?)?,
        };
        let vault_path = match &cli.vault {
            Some(path) => path.clone(),
            None => settings.vault_path.clone(),
        };
        let service = VaultService::with_clipboard(&settings, clipboard)?;
        Ok(Self {
            settings,
            vault_path,
            service,
        })
    }

    /// Prompt for the master password and unlock the vault.
    ///
    /// A wrong password and a damaged file produce the same message.
    pub fn unlock(&self) -> Result<()> {
        if !self.vault_path.exists() {
            return Err(PassVaultError::VaultNotFound(self.vault_path.clone()));
        }
        let password = prompt_password()?;
        if self.service.unlock_vault(&self.vault_path, &password)? {
            Ok(())
        } else {
            Err(PassVaultError::WrongPassword)
        }
    }

    /// Find an entry by full id, unique id prefix, or exact title
    /// (case-insensitive).
    pub fn resolve(&self, query: &str) -> Result<EntrySummary> {
        let entries = self.service.list_entries(&self.vault_path)?;
        resolve_entry(&entries, query)
    }
}

/// Pick the one entry that `query` names.
pub fn resolve_entry(entries: &[EntrySummary], query: &str) -> Result<EntrySummary> {
    let query = query.trim();

    if let Ok(id) = query.parse::<EntryId>() {
        return entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(PassVaultError::NotFound(id));
    }

    let folded = query.to_lowercase();
    let by_title: Vec<&EntrySummary> = entries
        .iter()
        .filter(|e| e.title.to_lowercase() == folded)
        .collect();
    let by_prefix: Vec<&EntrySummary> = if query.is_empty() {
        Vec::new()
    } else {
        let lower = query.to_ascii_lowercase();
        entries
            .iter()
            .filter(|e| e.id.to_string().starts_with(&lower))
            .collect()
    };

    match (by_title.as_slice(), by_prefix.as_slice()) {
        ([one], _) | ([], [one]) => Ok((*one).clone()),
        ([], []) => Err(PassVaultError::InvalidEntry(format!(
            "no entry matches '{query}'"
        ))),
        _ => Err(PassVaultError::InvalidEntry(format!(
            "'{query}' matches more than one entry, use the full id"
        ))),
    }
}

/// Get the master password, trying in order:
/// 1. `PASSVAULT_PASSWORD` env var (scripts/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation.
///
/// Respects `env_var` for scripted use. Enforces a minimum length.
pub fn prompt_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            if pw.chars().count() < MIN_PASSWORD_LEN {
                return Err(PassVaultError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .with_confirmation(
                    "Confirm master password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| PassVaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if password.chars().count() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

/// Read an entry password from stdin when piped, otherwise prompt.
pub fn read_entry_password(prompt: &str) -> Result<Zeroizing<String>> {
    use std::io::{self, IsTerminal, Read};

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']);
        return Ok(Zeroizing::new(trimmed.to_string()));
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}
