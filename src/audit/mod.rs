//! Audit log: SQLite-based operation history.
//!
//! Stores a record of every mutating vault operation (init, add, edit,
//! delete, passwd, copy) in a SQLite database next to the vault file,
//! named `<vault file>.audit.db`. Only operation names, vault paths,
//! entry ids and short details are stored; never titles, usernames or
//! passwords.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging. Without the
//! `audit-log` feature, `log_audit` is a no-op.

use std::path::{Path, PathBuf};

use crate::vault::EntryId;

#[cfg(feature = "audit-log")]
mod sqlite;

#[cfg(feature = "audit-log")]
pub use sqlite::{AuditEntry, AuditLog};

/// Return the path of the audit database that belongs to `vault_path`.
pub fn db_path(vault_path: &Path) -> PathBuf {
    let mut name = vault_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "vault".into());
    name.push(".audit.db");
    vault_path.with_file_name(name)
}

/// Convenience helper: log an audit event for the vault at `vault_path`.
///
/// Opens the audit database, logs the event, and silently ignores any
/// errors. This is safe to call from any command; it never fails the
/// parent operation.
#[cfg(feature = "audit-log")]
pub fn log_audit(vault_path: &Path, op: &str, entry: Option<EntryId>, details: Option<&str>) {
    match AuditLog::open(vault_path) {
        Some(audit) => audit.log(op, vault_path, entry, details),
        None => tracing::debug!(path = %vault_path.display(), "audit log unavailable"),
    }
}

#[cfg(not(feature = "audit-log"))]
pub fn log_audit(_vault_path: &Path, _op: &str, _entry: Option<EntryId>, _details: Option<&str>) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_sits_next_to_vault() {
        assert_eq!(
            db_path(Path::new("/home/u/vault.pvlt")),
            PathBuf::from("/home/u/vault.pvlt.audit.db")
        );
    }
}
