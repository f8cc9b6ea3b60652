//! Credential entries stored inside a vault.
//!
//! An `Entry` is the full plaintext credential and only ever exists in
//! memory of an unlocked session; its secret fields are wiped on drop.
//! `EntrySummary` is the non-secret view returned by listing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{PassVaultError, Result};

/// Maximum length of an entry title, in characters.
const MAX_TITLE_LEN: usize = 256;

/// Random, vault-unique identifier of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generate a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The 16 raw bytes, used as associated data when sealing.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EntryId {
    type Err = PassVaultError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| PassVaultError::InvalidEntry(format!("'{s}' is not an entry id: {e}")))
    }
}

/// A single credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Entry {
    #[zeroize(skip)]
    pub id: EntryId,

    /// Display name (not secret).
    pub title: String,

    pub username: String,

    pub password: String,

    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,

    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Build a new entry with a fresh id and both timestamps set to now.
    pub fn new(fields: &EntryFields) -> Result<Self> {
        validate_title(&fields.title)?;
        let now = Utc::now();
        Ok(Self {
            id: EntryId::generate(),
            title: fields.title.clone(),
            username: fields.username.clone(),
            password: fields.password.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Returns `true` if any field changed.
    ///
    /// `created_at` is preserved; `updated_at` moves only on change.
    pub fn apply(&mut self, patch: &EntryPatch) -> Result<bool> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }

        let mut changed = false;
        changed |= replace_if_different(&mut self.title, patch.title.as_deref());
        changed |= replace_if_different(&mut self.username, patch.username.as_deref());
        changed |= replace_if_different(&mut self.password, patch.password.as_deref());

        if changed {
            self.updated_at = Utc::now();
        }
        Ok(changed)
    }

    /// The non-secret view of this entry.
    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn replace_if_different(field: &mut String, value: Option<&str>) -> bool {
    match value {
        Some(v) if v != field.as_str() => {
            field.zeroize();
            *field = v.to_string();
            true
        }
        _ => false,
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Field values for a new entry.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct EntryFields {
    pub title: String,
    pub username: String,
    pub password: String,
}

impl EntryFields {
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A partial update; `None` leaves a field untouched.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl EntryPatch {
    /// Returns `true` if the patch would not touch any field.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.username.is_none() && self.password.is_none()
    }
}

/// Lightweight metadata about an entry (no username or password).
///
/// Returned by listing so callers can show titles without opening any
/// entry blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: EntryId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Titles must be non-empty after trimming and reasonably short.
fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(PassVaultError::InvalidEntry(
            "entry title cannot be empty".into(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(PassVaultError::InvalidEntry(format!(
            "entry title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_has_matching_timestamps() {
        let entry = Entry::new(&EntryFields::new("Mail", "a@b.com", "p@ss")).unwrap();
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.title, "Mail");
    }

    #[test]
    fn new_entry_rejects_blank_title() {
        let result = Entry::new(&EntryFields::new("   ", "u", "p"));
        assert!(matches!(result, Err(PassVaultError::InvalidEntry(_))));
    }

    #[test]
    fn ids_are_unique_and_parse_back() {
        let a = EntryId::generate();
        let b = EntryId::generate();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<EntryId>().unwrap(), a);
        assert!("not-an-id".parse::<EntryId>().is_err());
    }

    #[test]
    fn apply_preserves_created_at() {
        let mut entry = Entry::new(&EntryFields::new("Mail", "a@b.com", "p@ss")).unwrap();
        let created = entry.created_at;
        let patch = EntryPatch {
            title: None,
            username: None,
            password: Some("n3w".into()),
        };
        assert!(entry.apply(&patch).unwrap());
        assert_eq!(entry.created_at, created);
        assert_eq!(entry.password, "n3w");
        assert_eq!(entry.username, "a@b.com");
    }

    #[test]
    fn apply_same_values_reports_no_change() {
        let mut entry = Entry::new(&EntryFields::new("Mail", "a@b.com", "p@ss")).unwrap();
        let before = entry.updated_at;
        let patch = EntryPatch {
            title: Some("Mail".into()),
            username: None,
            password: None,
        };
        assert!(!entry.apply(&patch).unwrap());
        assert_eq!(entry.updated_at, before);
    }

    #[test]
    fn debug_redacts_secrets() {
        let entry = Entry::new(&EntryFields::new("Mail", "alice@example.com", "hunter2")).unwrap();
        let shown = format!("{entry:?}");
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("alice@example.com"));
        assert!(shown.contains("Mail"));
    }
}
