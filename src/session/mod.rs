//! Session/Lock Controller: the in-memory unlocked state of one vault.
//!
//! The controller holds at most one `Session` (derived key, vault path,
//! last-activity time) behind a `parking_lot::RwLock`. Reads of the vault
//! share the read lock; mutations take the write lock, so file writes are
//! serialized. Every path to `Locked` wipes the key before it is released.
//!
//! Auto-lock is decided by `check_auto_lock`, which the caller polls. An
//! entry operation on a session that has already timed out but has not
//! been polled yet fails with `VaultLocked` and does not revive it.

mod clock;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use subtle::ConstantTimeEq;

use crate::crypto::{KdfParams, MasterKey};
use crate::errors::{PassVaultError, Result};
use crate::vault::{NewKey, VaultStore};

pub use clock::{Clock, ManualClock, SystemClock};

/// Default inactivity threshold before auto-lock.
pub const DEFAULT_AUTO_LOCK: Duration = Duration::from_secs(300);

struct Session {
    store: VaultStore,
    key: MasterKey,
    last_activity: Mutex<Instant>,
}

impl Session {
    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_activity.lock())
    }

    /// Overwrite the key, then drop the session.
    fn close(mut self) {
        self.key.wipe();
    }
}

/// Owns the single active session, if any.
pub struct SessionController {
    state: RwLock<Option<Session>>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SessionController {
    /// A locked controller using the system clock.
    pub fn new(timeout: Duration) -> Self {
        Self::with_clock(timeout, Arc::new(SystemClock))
    }

    /// A locked controller using the given clock.
    pub fn with_clock(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(None),
            clock,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Derive the key for the vault at `path` and start a session.
    ///
    /// The key derivation runs before any lock is taken, so status polls
    /// and the auto-lock check are not held up by it. A previous session
    /// is replaced and its key wiped. On failure the current state is left
    /// as it was.
    pub fn unlock(&self, path: &Path, password: &[u8]) -> Result<()> {
        let key = VaultStore::unlock(path, password)?;
        let session = Session {
            store: VaultStore::at(path),
            key,
            last_activity: Mutex::new(self.clock.now()),
        };

        let previous = self.state.write().replace(session);
        if let Some(old) = previous {
            old.close();
            tracing::debug!("previous session replaced");
        }

        tracing::info!(path = %path.display(), "session unlocked");
        Ok(())
    }

    /// Explicitly lock. Returns `true` if a session was open.
    pub fn lock(&self) -> bool {
        let taken = self.state.write().take();
        match taken {
            Some(session) => {
                session.close();
                tracing::info!("session locked");
                true
            }
            None => false,
        }
    }

    /// `true` when no usable session exists, including one that has
    /// timed out and is waiting for `check_auto_lock`.
    pub fn is_locked(&self) -> bool {
        let now = self.clock.now();
        match self.state.read().as_ref() {
            Some(session) => session.idle_for(now) >= self.timeout,
            None => true,
        }
    }

    /// Path of the unlocked vault, if any.
    pub fn vault_path(&self) -> Option<PathBuf> {
        self.state
            .read()
            .as_ref()
            .map(|s| s.store.path().to_path_buf())
    }

    /// Time left before the session auto-locks, or `None` when locked.
    pub fn time_until_lock(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.state
            .read()
            .as_ref()
            .map(|s| self.timeout.saturating_sub(s.idle_for(now)))
    }

    /// Refresh the activity timestamp.
    ///
    /// Returns `false` if there is no live session; an expired session is
    /// not revived.
    pub fn record_activity(&self) -> bool {
        let now = self.clock.now();
        match self.state.read().as_ref() {
            Some(session) if session.idle_for(now) < self.timeout => {
                *session.last_activity.lock() = now;
                true
            }
            _ => false,
        }
    }

    /// Lock the session if it has been idle for the full timeout.
    ///
    /// Returns `true` exactly once per timeout crossing: concurrent callers
    /// race for the write lock and only the first one finds a session to
    /// close. Does not count as activity.
    pub fn check_auto_lock(&self) -> bool {
        if !self.is_expired() {
            return false;
        }

        let mut state = self.state.write();
        // Re-check under the write lock: another caller may have locked
        // or the session may have been replaced meanwhile.
        let now = self.clock.now();
        let expired = matches!(state.as_ref(), Some(s) if s.idle_for(now) >= self.timeout);
        if !expired {
            return false;
        }

        if let Some(session) = state.take() {
            session.close();
        }
        drop(state);

        tracing::info!(timeout_secs = self.timeout.as_secs(), "session auto-locked");
        true
    }

    fn is_expired(&self) -> bool {
        let now = self.clock.now();
        matches!(self.state.read().as_ref(), Some(s) if s.idle_for(now) >= self.timeout)
    }

    /// Run a read-only vault operation. Counts as activity.
    pub fn read<R>(&self, op: impl FnOnce(&VaultStore, &MasterKey) -> Result<R>) -> Result<R> {
        let state = self.state.read();
        let session = self.live(state.as_ref())?;
        op(&session.store, &session.key)
    }

    /// Run a mutating vault operation. Counts as activity.
    pub fn write<R>(&self, op: impl FnOnce(&VaultStore, &MasterKey) -> Result<R>) -> Result<R> {
        let state = self.state.write();
        let session = self.live(state.as_ref())?;
        op(&session.store, &session.key)
    }

    /// Re-key the open vault and keep the session on the new key.
    ///
    /// `old_password` is re-checked against the file first. Both key
    /// derivations run with no lock held; the write lock is taken only to
    /// reseal, swap the file and adopt the new key.
    pub fn change_password(
        &self,
        old_password: &[u8],
        new_password: &[u8],
        params: &KdfParams,
    ) -> Result<()> {
        let path = {
            let state = self.state.read();
            match state.as_ref() {
                Some(s) if s.idle_for(self.clock.now()) < self.timeout => {
                    s.store.path().to_path_buf()
                }
                _ => return Err(PassVaultError::VaultLocked),
            }
        };

        let check = VaultStore::unlock(&path, old_password)?;
        let new_key = NewKey::derive(new_password, params)?;

        let mut state = self.state.write();
        // The session may have locked, expired or been replaced while the
        // keys were derived.
        let session = match state.as_mut() {
            Some(s)
                if s.idle_for(self.clock.now()) < self.timeout
                    && s.store.path() == path.as_path() =>
            {
                s
            }
            _ => return Err(PassVaultError::VaultLocked),
        };
        if !bool::from(check.as_bytes()[..].ct_eq(&session.key.as_bytes()[..])) {
            return Err(PassVaultError::WrongPassword);
        }

        session.store.rekey(&session.key, &new_key)?;
        let mut old_key = std::mem::replace(&mut session.key, new_key.into_key());
        old_key.wipe();
        *session.last_activity.lock() = self.clock.now();
        Ok(())
    }

    /// The session if it is still live, with its activity refreshed.
    fn live<'a>(&self, session: Option<&'a Session>) -> Result<&'a Session> {
        let now = self.clock.now();
        match session {
            Some(s) if s.idle_for(now) < self.timeout => {
                *s.last_activity.lock() = now;
                Ok(s)
            }
            _ => Err(PassVaultError::VaultLocked),
        }
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_LOCK)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(session) = self.state.get_mut().take() {
            session.close();
        }
    }
}
