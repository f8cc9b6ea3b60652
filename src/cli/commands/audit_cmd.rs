//! `passvault audit`: display the audit log of the selected vault.
//!
//! Usage:
//!   passvault audit               # last 50 operations
//!   passvault audit --last 20
//!   passvault audit --since 7d

use chrono::{DateTime, Utc};

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{PassVaultError, Result};

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    use crate::audit::AuditLog;

    let ctx = Context::load(cli)?;
    let since = since.map(parse_since).transpose()?;

    let audit = AuditLog::open(&ctx.vault_path)
        .ok_or_else(|| PassVaultError::AuditError("failed to open audit database".into()))?;
    let entries = audit.query(last, since)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

#[cfg(not(feature = "audit-log"))]
pub fn execute(_cli: &Cli, _last: usize, _since: Option<&str>) -> Result<()> {
    Err(PassVaultError::CommandFailed(
        "this build has no audit log (enable the `audit-log` feature)".into(),
    ))
}

/// Turn "7d", "24h" or "30m" into the point in time that long ago.
fn parse_since(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        PassVaultError::CommandFailed(format!(
            "invalid duration '{input}', use a form like 7d, 24h or 30m"
        ))
    };

    let (split, _) = input.char_indices().last().ok_or_else(invalid)?;
    let (num, unit) = input.split_at(split);
    let num: i64 = num.parse().map_err(|_| invalid())?;

    let span = match unit {
        "d" => chrono::Duration::days(num),
        "h" => chrono::Duration::hours(num),
        "m" => chrono::Duration::minutes(num),
        _ => return Err(invalid()),
    };
    Ok(Utc::now() - span)
}

#[cfg(feature = "audit-log")]
fn print_audit_table(entries: &[crate::audit::AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Entry", "Details"]);

    for entry in entries {
        let short_id = entry
            .entry_id
            .as_deref()
            .map(|id| id.chars().take(8).collect::<String>())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            short_id,
            entry.details.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" | "add" => style(op).green().to_string(),
        "edit" => style(op).blue().to_string(),
        "delete" => style(op).red().to_string(),
        "passwd" => style(op).yellow().to_string(),
        "copy" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_accepts_days_hours_minutes() {
        let days = Utc::now() - parse_since("7d").unwrap();
        assert!((days.num_days() - 7).abs() <= 1);

        let hours = Utc::now() - parse_since("24h").unwrap();
        assert!((hours.num_hours() - 24).abs() <= 1);

        let mins = Utc::now() - parse_since(" 30m ").unwrap();
        assert!((mins.num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn since_rejects_garbage() {
        for bad in ["", "d", "abc", "7x", "7"] {
            assert!(parse_since(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn unknown_operations_pass_through() {
        assert_eq!(colorize_operation("mystery"), "mystery");
        assert!(colorize_operation("delete").contains("delete"));
    }
}
