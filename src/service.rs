//! The command surface: one method per named call a front end issues.
//!
//! `VaultService` owns the session controller and the clipboard guard.
//! Entry calls take the vault path the caller believes is open; a call
//! naming any other vault fails with `VaultLocked`, the same as a call
//! made while nothing is unlocked.

use std::path::Path;
use std::sync::Arc;

use crate::clipboard::{Clipboard, ClipboardGuard, SystemClipboard};
use crate::config::Settings;
use crate::crypto::KdfParams;
use crate::errors::{PassVaultError, Result};
use crate::generator::{self, GeneratorPolicy};
use crate::session::SessionController;
use crate::vault::{Entry, EntryFields, EntryId, EntryPatch, EntrySummary, VaultStore};

pub struct VaultService {
    session: SessionController,
    clipboard: ClipboardGuard,
    kdf: KdfParams,
}

impl VaultService {
    pub fn new(session: SessionController, clipboard: ClipboardGuard, kdf: KdfParams) -> Self {
        Self {
            session,
            clipboard,
            kdf,
        }
    }

    /// A service wired to the system clipboard and clock.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::with_clipboard(settings, Arc::new(SystemClipboard::new()))
    }

    /// A service using `settings` and the given clipboard.
    pub fn with_clipboard(settings: &Settings, clipboard: Arc<dyn Clipboard>) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(
            SessionController::new(settings.auto_lock()),
            ClipboardGuard::with_delay(clipboard, settings.clipboard_delay()),
            settings.kdf_params(),
        ))
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn clipboard(&self) -> &ClipboardGuard {
        &self.clipboard
    }

    // ── Vault lifecycle ──────────────────────────────────────────────

    pub fn create_vault(&self, path: &Path, master_password: &str) -> Result<()> {
        VaultStore::create(path, master_password.as_bytes(), &self.kdf).map(|_| ())
    }

    /// `Ok(false)` for a wrong password and for a vault that fails
    /// authentication; the two are only told apart in the logs.
    pub fn unlock_vault(&self, path: &Path, master_password: &str) -> Result<bool> {
        match self.session.unlock(path, master_password.as_bytes()) {
            Ok(()) => Ok(true),
            Err(PassVaultError::WrongPassword) => {
                tracing::warn!(path = %path.display(), kind = "wrong_password", "unlock refused");
                Ok(false)
            }
            Err(PassVaultError::CorruptVault(detail)) => {
                tracing::warn!(path = %path.display(), kind = "corrupt_vault", %detail, "unlock refused");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn lock_vault(&self) -> bool {
        self.session.lock()
    }

    pub fn is_locked(&self) -> bool {
        self.session.is_locked()
    }

    pub fn check_auto_lock(&self) -> bool {
        self.session.check_auto_lock()
    }

    pub fn record_activity(&self) -> Result<()> {
        self.session.record_activity();
        Ok(())
    }

    pub fn change_master_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        self.session
            .change_password(old_password.as_bytes(), new_password.as_bytes(), &self.kdf)
    }

    // ── Entries ──────────────────────────────────────────────────────

    pub fn list_entries(&self, path: &Path) -> Result<Vec<EntrySummary>> {
        self.session.read(|store, key| {
            ensure_same_vault(store, path)?;
            store.list(key)
        })
    }

    pub fn read_entry(&self, path: &Path, id: EntryId) -> Result<Entry> {
        self.session.read(|store, key| {
            ensure_same_vault(store, path)?;
            store.read_entry(key, id)
        })
    }

    pub fn create_entry(
        &self,
        path: &Path,
        title: &str,
        username: &str,
        password: &str,
    ) -> Result<EntryId> {
        let fields = EntryFields::new(title, username, password);
        self.session.write(|store, key| {
            ensure_same_vault(store, path)?;
            store.create_entry(key, &fields)
        })
    }

    pub fn update_entry(&self, path: &Path, id: EntryId, patch: &EntryPatch) -> Result<bool> {
        self.session.write(|store, key| {
            ensure_same_vault(store, path)?;
            store.update_entry(key, id, patch)
        })
    }

    pub fn delete_entry(&self, path: &Path, id: EntryId) -> Result<bool> {
        self.session.write(|store, key| {
            ensure_same_vault(store, path)?;
            store.delete_entry(key, id)
        })
    }

    // ── Clipboard ────────────────────────────────────────────────────

    pub fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        self.clipboard.copy(text)
    }

    /// Copy an entry's password without handing it to the caller.
    pub fn copy_entry_password(&self, path: &Path, id: EntryId) -> Result<()> {
        let entry = self.read_entry(path, id)?;
        self.clipboard.copy(&entry.password)
    }

    // ── Generator ────────────────────────────────────────────────────

    pub fn generate_password_preset(&self, preset: &str) -> Result<String> {
        generator::generate_preset(preset)
    }

    pub fn generate_password_custom(&self, policy: &GeneratorPolicy) -> Result<String> {
        generator::generate_custom(policy)
    }

    pub fn generate_pronounceable(&self, length: usize) -> Result<String> {
        generator::generate_pronounceable(length)
    }
}

/// Fail with `VaultLocked` unless `path` names the unlocked vault.
fn ensure_same_vault(store: &VaultStore, path: &Path) -> Result<()> {
    if store.path() == path {
        return Ok(());
    }
    match (store.path().canonicalize(), path.canonicalize()) {
        (Ok(a), Ok(b)) if a == b => Ok(()),
        _ => Err(PassVaultError::VaultLocked),
    }
}
