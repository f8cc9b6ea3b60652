//! Vault File Store: create, unlock and entry CRUD against one file.
//!
//! The file on disk is the source of truth. Every operation re-reads it,
//! checks the caller's key against the header, opens the envelope, and
//! (for mutations) stages a complete new image before swapping it in.
//! Callers are expected to serialize mutations; `session` does that.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::crypto::kdf::{self, generate_salt, KdfParams, SALT_LEN};
use crate::crypto::MasterKey;
use crate::errors::{PassVaultError, Result};

use super::codec;
use super::entry::{Entry, EntryFields, EntryId, EntryPatch, EntrySummary};
use super::format::{self, EntryRecord, VaultHeader};

/// A handle on a vault file. Holds no key material.
#[derive(Debug, Clone)]
pub struct VaultStore {
    path: PathBuf,
}

/// A fresh salt and the key derived from it, ready for `rekey`.
///
/// Deriving is the slow part of a password change, so it is done up
/// front, away from any lock the caller holds.
pub struct NewKey {
    salt: [u8; SALT_LEN],
    params: KdfParams,
    key: MasterKey,
}

impl NewKey {
    pub fn derive(password: &[u8], params: &KdfParams) -> Result<Self> {
        let salt = generate_salt();
        let key = kdf::derive(password, &salt, params)?;
        Ok(Self {
            salt,
            params: *params,
            key,
        })
    }

    pub fn into_key(self) -> MasterKey {
        self.key
    }
}

/// Header + records of a vault whose key has been checked.
struct Loaded {
    header: VaultHeader,
    records: Vec<EntryRecord>,
}

impl VaultStore {
    /// A handle on the vault at `path`. Touches nothing on disk.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the vault file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Create / unlock
    // ------------------------------------------------------------------

    /// Create a brand-new, empty vault file at `path`.
    ///
    /// Generates a random salt, derives the key from the password, and
    /// writes an authenticated empty envelope. Refuses to replace an
    /// existing file; deleting an old vault is the caller's decision.
    pub fn create(path: &Path, password: &[u8], params: &KdfParams) -> Result<Self> {
        if path.exists() {
            return Err(PassVaultError::PathExists(path.to_path_buf()));
        }
        params.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let salt = generate_salt();
        let key = kdf::derive(password, &salt, params)?;
        let header = VaultHeader::new(&salt, *params, &key)?;

        format::stage_vault(path, &header, &[], &key)?.commit_new()?;

        tracing::info!(path = %path.display(), "vault created");
        Ok(Self::at(path))
    }

    /// Re-derive the key from `password` and prove it against the file.
    ///
    /// Returns `WrongPassword` when the key check fails and
    /// `CorruptVault` when the key is right but the envelope does not
    /// authenticate. Callers showing this to a user should not tell the
    /// two apart.
    pub fn unlock(path: &Path, password: &[u8]) -> Result<MasterKey> {
        let raw = format::read_vault(path)?;
        let key = kdf::derive(password, &raw.header.salt, &raw.header.kdf.params)?;

        format::verify_key_check(&key, &raw.header)?;
        let records = raw.open_records(&key)?;

        tracing::debug!(path = %path.display(), entries = records.len(), "vault unlocked");
        Ok(key)
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// Non-secret metadata for every entry, sorted by title.
    pub fn list(&self, key: &MasterKey) -> Result<Vec<EntrySummary>> {
        let loaded = self.load(key)?;
        let mut list: Vec<EntrySummary> = loaded
            .records
            .iter()
            .map(|r| EntrySummary {
                id: r.id,
                title: r.title.clone(),
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect();

        list.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(list)
    }

    /// Decrypt one entry, including its username and password.
    pub fn read_entry(&self, key: &MasterKey, id: EntryId) -> Result<Entry> {
        let loaded = self.load(key)?;
        let record = loaded
            .records
            .iter()
            .find(|r| r.id == id)
            .ok_or(PassVaultError::NotFound(id))?;
        open_record(record, key)
    }

    /// Add a new entry and return its freshly generated id.
    pub fn create_entry(&self, key: &MasterKey, fields: &EntryFields) -> Result<EntryId> {
        let mut loaded = self.load(key)?;

        let mut entry = Entry::new(fields)?;
        let taken: HashSet<EntryId> = loaded.records.iter().map(|r| r.id).collect();
        while taken.contains(&entry.id) {
            entry.id = EntryId::generate();
        }

        loaded.records.push(seal_record(&entry, key)?);
        self.save(&loaded, key)?;

        tracing::info!(entry = %entry.id, "entry created");
        Ok(entry.id)
    }

    /// Apply `patch` to an entry. Returns `false` if no such entry exists.
    pub fn update_entry(&self, key: &MasterKey, id: EntryId, patch: &EntryPatch) -> Result<bool> {
        let mut loaded = self.load(key)?;
        let Some(index) = loaded.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };

        let mut entry = open_record(&loaded.records[index], key)?;
        if !entry.apply(patch)? {
            return Ok(true);
        }

        loaded.records[index] = seal_record(&entry, key)?;
        self.save(&loaded, key)?;

        tracing::info!(entry = %id, "entry updated");
        Ok(true)
    }

    /// Remove an entry. Returns `false` if no such entry exists.
    pub fn delete_entry(&self, key: &MasterKey, id: EntryId) -> Result<bool> {
        let mut loaded = self.load(key)?;
        let before = loaded.records.len();
        loaded.records.retain(|r| r.id != id);
        if loaded.records.len() == before {
            return Ok(false);
        }

        self.save(&loaded, key)?;

        tracing::info!(entry = %id, "entry deleted");
        Ok(true)
    }

    /// Re-encrypt the whole vault under a new password and fresh salt.
    ///
    /// Every entry is opened with `old_key` and resealed with the new
    /// key before the file is swapped; on any failure the old file stays.
    pub fn change_password(
        &self,
        old_key: &MasterKey,
        new_password: &[u8],
        params: &KdfParams,
    ) -> Result<MasterKey> {
        let new_key = NewKey::derive(new_password, params)?;
        self.rekey(old_key, &new_key)?;
        Ok(new_key.into_key())
    }

    /// Reseal every entry under an already derived `new_key` and swap the
    /// file. No key derivation happens here.
    pub fn rekey(&self, old_key: &MasterKey, new_key: &NewKey) -> Result<()> {
        let loaded = self.load(old_key)?;

        let mut header = VaultHeader::new(&new_key.salt, new_key.params, &new_key.key)?;
        header.created_at = loaded.header.created_at;

        let mut records = Vec::with_capacity(loaded.records.len());
        for record in &loaded.records {
            let entry = open_record(record, old_key)?;
            records.push(seal_record(&entry, &new_key.key)?);
        }

        let rekeyed = Loaded { header, records };
        self.save(&rekeyed, &new_key.key)?;

        tracing::info!(entries = rekeyed.records.len(), "vault re-keyed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn load(&self, key: &MasterKey) -> Result<Loaded> {
        let raw = format::read_vault(&self.path)?;
        format::verify_key_check(key, &raw.header)?;
        let records = raw.open_records(key)?;
        Ok(Loaded {
            header: raw.header,
            records,
        })
    }

    fn save(&self, loaded: &Loaded, key: &MasterKey) -> Result<()> {
        format::write_vault(&self.path, &loaded.header, &loaded.records, key)
    }
}

fn seal_record(entry: &Entry, key: &MasterKey) -> Result<EntryRecord> {
    Ok(EntryRecord {
        id: entry.id,
        title: entry.title.clone(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        sealed: codec::seal(entry, key)?,
    })
}

fn open_record(record: &EntryRecord, key: &MasterKey) -> Result<Entry> {
    let entry = codec::open(&record.sealed, key)?;
    if entry.id != record.id {
        tracing::warn!(entry = %record.id, "sealed entry id does not match its record");
        return Err(PassVaultError::AuthenticationFailure);
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_vault(password: &str) -> (TempDir, VaultStore, MasterKey) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.pvlt");
        let store = VaultStore::create(&path, password.as_bytes(), &KdfParams::minimum()).unwrap();
        let key = VaultStore::unlock(&path, password.as_bytes()).unwrap();
        (dir, store, key)
    }

    #[test]
    fn create_refuses_existing_path() {
        let (_dir, store, _key) = new_vault("pw");
        let result = VaultStore::create(store.path(), b"pw", &KdfParams::minimum());
        assert!(matches!(result, Err(PassVaultError::PathExists(_))));
    }

    #[test]
    fn create_makes_missing_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("v.pvlt");
        VaultStore::create(&path, b"pw", &KdfParams::minimum()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unlock_with_wrong_password_fails() {
        let (_dir, store, _key) = new_vault("right");
        assert!(matches!(
            VaultStore::unlock(store.path(), b"wrong"),
            Err(PassVaultError::WrongPassword)
        ));
    }

    #[test]
    fn list_is_sorted_case_insensitively() {
        let (_dir, store, key) = new_vault("pw");
        for title in ["bank", "Alpha", "charlie"] {
            store
                .create_entry(&key, &EntryFields::new(title, "u", "p"))
                .unwrap();
        }
        let titles: Vec<String> = store
            .list(&key)
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, ["Alpha", "bank", "charlie"]);
    }

    #[test]
    fn update_unknown_entry_returns_false() {
        let (_dir, store, key) = new_vault("pw");
        let patch = EntryPatch {
            title: Some("x".into()),
            username: None,
            password: None,
        };
        assert!(!store.update_entry(&key, EntryId::generate(), &patch).unwrap());
    }

    #[test]
    fn noop_update_leaves_file_untouched() {
        let (_dir, store, key) = new_vault("pw");
        let id = store
            .create_entry(&key, &EntryFields::new("Mail", "u", "p"))
            .unwrap();
        let before = fs::read(store.path()).unwrap();

        let patch = EntryPatch {
            title: Some("Mail".into()),
            username: None,
            password: None,
        };
        assert!(store.update_entry(&key, id, &patch).unwrap());
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn change_password_keeps_entries_and_rejects_old_password() {
        let (_dir, store, key) = new_vault("old");
        let id = store
            .create_entry(&key, &EntryFields::new("Mail", "a@b.com", "p@ss"))
            .unwrap();

        let new_key = store
            .change_password(&key, b"new", &KdfParams::minimum())
            .unwrap();

        assert!(matches!(
            VaultStore::unlock(store.path(), b"old"),
            Err(PassVaultError::WrongPassword)
        ));
        VaultStore::unlock(store.path(), b"new").unwrap();
        assert_eq!(store.read_entry(&new_key, id).unwrap().password, "p@ss");
        assert!(matches!(
            store.list(&key),
            Err(PassVaultError::WrongPassword)
        ));
    }

    #[test]
    fn record_with_foreign_blob_is_rejected() {
        let (_dir, store, key) = new_vault("pw");
        let a = store
            .create_entry(&key, &EntryFields::new("A", "ua", "pa"))
            .unwrap();
        let b = store
            .create_entry(&key, &EntryFields::new("B", "ub", "pb"))
            .unwrap();

        // Move B's sealed blob under A's record.
        let mut loaded = store.load(&key).unwrap();
        let blob_b = loaded
            .records
            .iter()
            .find(|r| r.id == b)
            .unwrap()
            .sealed
            .clone();
        loaded
            .records
            .iter_mut()
            .find(|r| r.id == a)
            .unwrap()
            .sealed = blob_b;
        store.save(&loaded, &key).unwrap();

        assert!(matches!(
            store.read_entry(&key, a),
            Err(PassVaultError::AuthenticationFailure)
        ));
    }
}
