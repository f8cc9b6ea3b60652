//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::errors::{ErrorCategory, PassVaultError};
use crate::vault::{Entry, EntrySummary};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print an error with wording chosen by its category.
pub fn report(err: &PassVaultError) {
    error(&err.to_string());
    match err.category() {
        ErrorCategory::Retry => {}
        ErrorCategory::DataAtRisk => warning(
            "Your data may be at risk. Keep a copy of the vault file before changing anything.",
        ),
        ErrorCategory::Transient => {
            eprintln!("{}", style("This may succeed if you try again.").dim())
        }
        ErrorCategory::Misuse => {}
    }
}

/// Print a table of entries (Id, Title, Created, Updated).
pub fn print_entries_table(entries: &[EntrySummary]) {
    if entries.is_empty() {
        info("No entries in this vault yet.");
        tip("Run `passvault add <TITLE>` to add your first entry.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Title", "Created", "Updated"]);

    for e in entries {
        let id = e.id.to_string();
        table.add_row(vec![
            id[..8].to_string(),
            e.title.clone(),
            e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print one entry; the password is masked unless `reveal` is set.
pub fn print_entry(entry: &Entry, reveal: bool) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let password = if reveal {
        entry.password.clone()
    } else {
        "********".to_string()
    };

    table.add_row(vec!["Id".to_string(), entry.id.to_string()]);
    table.add_row(vec!["Title".to_string(), entry.title.clone()]);
    table.add_row(vec!["Username".to_string(), entry.username.clone()]);
    table.add_row(vec!["Password".to_string(), password]);
    table.add_row(vec![
        "Created".to_string(),
        entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    table.add_row(vec![
        "Updated".to_string(),
        entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);

    println!("{table}");
}
