use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::{PassVaultError, Result};
use crate::vault::EntryId;

use super::db_path;

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub vault: String,
    pub entry_id: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database belonging to `vault_path`.
    ///
    /// Returns `None` if the database can't be opened; callers should
    /// treat this as "audit logging unavailable" and continue normally.
    pub fn open(vault_path: &Path) -> Option<Self> {
        let db_path = db_path(vault_path);
        let conn = Connection::open(&db_path).ok()?;

        // Set restrictive permissions on the audit database (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                vault       TEXT NOT NULL,
                entry_id    TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record an operation. Fire-and-forget: errors are only traced.
    pub fn log(&self, operation: &str, vault: &Path, entry: Option<EntryId>, details: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        let vault = vault.display().to_string();
        let entry = entry.map(|id| id.to_string());
        if let Err(e) = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, vault, entry_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, operation, vault, entry, details],
        ) {
            tracing::debug!(error = %e, "audit insert failed");
        }
    }

    /// Most recent entries first, at most `limit` of them, optionally only
    /// those at or after `since`.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let since = since.map(|ts| ts.to_rfc3339());

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, vault, entry_id, details
                 FROM audit_log
                 WHERE ?1 IS NULL OR timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| PassVaultError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since, limit], row_to_entry)
            .map_err(|e| PassVaultError::AuditError(format!("query exec: {e}")))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PassVaultError::AuditError(format!("row parse: {e}")))
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let raw_ts: String = row.get(1)?;
    // Rows are only written by `log`; an unparsable stamp means a
    // hand-edited database, shown as the epoch rather than failing.
    let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default();

    Ok(AuditEntry {
        id: row.get(0)?,
        timestamp,
        operation: row.get(2)?,
        vault: row.get(3)?,
        entry_id: row.get(4)?,
        details: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault_in(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("vault.pvlt")
    }

    #[test]
    fn open_creates_database_next_to_vault() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::open(&vault_in(&dir));
        assert!(audit.is_some(), "should open successfully");
        assert!(dir.path().join("vault.pvlt.audit.db").exists());
    }

    #[test]
    fn log_and_query_most_recent_first() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        let audit = AuditLog::open(&vault).unwrap();

        let id = EntryId::generate();
        audit.log("init", &vault, None, Some("vault created"));
        audit.log("add", &vault, Some(id), None);
        audit.log("delete", &vault, Some(id), None);

        let entries = audit.query(10, None).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].operation, "delete");
        assert_eq!(entries[1].entry_id.as_deref(), Some(id.to_string().as_str()));
        assert_eq!(entries[2].details.as_deref(), Some("vault created"));
        assert!(entries[2].entry_id.is_none());
    }

    #[test]
    fn query_with_limit() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        let audit = AuditLog::open(&vault).unwrap();

        for _ in 0..10 {
            audit.log("add", &vault, Some(EntryId::generate()), None);
        }

        assert_eq!(audit.query(3, None).unwrap().len(), 3);
    }

    #[test]
    fn query_with_since_filter() {
        let dir = TempDir::new().unwrap();
        let vault = vault_in(&dir);
        let audit = AuditLog::open(&vault).unwrap();

        audit.log("add", &vault, None, None);

        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(audit.query(10, Some(past)).unwrap().len(), 1);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(audit.query(10, Some(future)).unwrap().len(), 0);
    }

    #[test]
    fn open_returns_none_on_bad_path() {
        let result = AuditLog::open(Path::new("/nonexistent/path/that/does/not/exist/v.pvlt"));
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn audit_db_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let _audit = AuditLog::open(&vault_in(&dir)).unwrap();

        let perms = std::fs::metadata(dir.path().join("vault.pvlt.audit.db"))
            .unwrap()
            .permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
