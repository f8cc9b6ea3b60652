//! Clipboard Guard: copy a secret and clear it again after a delay.
//!
//! The clipboard itself is a capability (`Clipboard`): `SystemClipboard`
//! talks to the desktop through `arboard`, `MemoryClipboard` keeps the
//! text in process for tests and headless use.
//!
//! Each copy schedules one clear on its own timer thread. A newer copy
//! cancels the older timer. When a timer fires it reads the clipboard
//! back and clears it only if it still holds the secret it copied.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::errors::{PassVaultError, Result};

/// Default time a copied secret stays on the clipboard.
pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_secs(30);

/// Read/write access to a text clipboard.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;

    /// Current text contents, `None` if the clipboard holds no text.
    fn get_text(&self) -> Result<Option<Zeroizing<String>>>;

    fn clear(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// The desktop clipboard, opened on first use.
///
/// The `arboard::Clipboard` handle is kept once opened; on X11 the copied
/// text is only served while that handle is alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(
        &self,
        op: impl FnOnce(&mut arboard::Clipboard) -> std::result::Result<R, arboard::Error>,
    ) -> std::result::Result<R, arboard::Error> {
        let mut inner = self.inner.lock();
        if inner.is_none() {
            *inner = Some(arboard::Clipboard::new()?);
        }
        match inner.as_mut() {
            Some(clipboard) => op(clipboard),
            None => Err(arboard::Error::ClipboardNotSupported),
        }
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        self.with(|c| c.set_text(text))
            .map_err(|e| PassVaultError::ClipboardError(format!("cannot write clipboard: {e}")))
    }

    fn get_text(&self) -> Result<Option<Zeroizing<String>>> {
        match self.with(|c| c.get_text()) {
            Ok(text) => Ok(Some(Zeroizing::new(text))),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(PassVaultError::ClipboardError(format!(
                "cannot read clipboard: {e}"
            ))),
        }
    }

    fn clear(&self) -> Result<()> {
        self.with(|c| c.clear())
            .map_err(|e| PassVaultError::ClipboardError(format!("cannot clear clipboard: {e}")))
    }
}

/// An in-process clipboard.
#[derive(Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<Zeroizing<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current contents.
    pub fn contents(&self) -> Option<String> {
        self.text.lock().as_ref().map(|t| t.to_string())
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        *self.text.lock() = Some(Zeroizing::new(text.to_string()));
        Ok(())
    }

    fn get_text(&self) -> Result<Option<Zeroizing<String>>> {
        Ok(self.text.lock().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.text.lock() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Waiting,
    ClearNow,
    Cancelled,
}

struct TimerSignal {
    state: Mutex<TimerState>,
    wake: Condvar,
}

impl TimerSignal {
    fn send(&self, to: TimerState) {
        let mut state = self.state.lock();
        if *state == TimerState::Waiting {
            *state = to;
        }
        self.wake.notify_all();
    }
}

struct PendingClear {
    signal: Arc<TimerSignal>,
    handle: JoinHandle<()>,
}

impl PendingClear {
    fn finish(self, how: TimerState) {
        self.signal.send(how);
        if self.handle.join().is_err() {
            tracing::warn!("clipboard timer thread panicked");
        }
    }
}

/// Copies secrets to a clipboard and clears them after a delay.
pub struct ClipboardGuard {
    clipboard: Arc<dyn Clipboard>,
    delay: Duration,
    pending: Mutex<Option<PendingClear>>,
}

impl ClipboardGuard {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        Self::with_delay(clipboard, DEFAULT_CLEAR_DELAY)
    }

    pub fn with_delay(clipboard: Arc<dyn Clipboard>, delay: Duration) -> Self {
        Self {
            clipboard,
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Copy using the guard's default delay.
    pub fn copy(&self, secret: &str) -> Result<()> {
        self.copy_with_auto_clear(secret, self.delay)
    }

    /// Put `secret` on the clipboard and schedule a clear after `delay`.
    ///
    /// An earlier pending clear is cancelled once the new text is written.
    /// If the write fails, the earlier secret is cleared immediately.
    pub fn copy_with_auto_clear(&self, secret: &str, delay: Duration) -> Result<()> {
        let mut pending = self.pending.lock();
        if let Err(e) = self.clipboard.set_text(secret) {
            // The older secret may still be on the clipboard; clear it
            // rather than leave it without a timer.
            if let Some(previous) = pending.take() {
                previous.finish(TimerState::ClearNow);
            }
            return Err(e);
        }
        if let Some(previous) = pending.take() {
            previous.finish(TimerState::Cancelled);
        }

        let signal = Arc::new(TimerSignal {
            state: Mutex::new(TimerState::Waiting),
            wake: Condvar::new(),
        });
        let copied = Zeroizing::new(secret.to_string());
        let clipboard = Arc::clone(&self.clipboard);
        let timer_signal = Arc::clone(&signal);
        let deadline = Instant::now() + delay;

        let spawned = thread::Builder::new()
            .name("passvault-clipboard".into())
            .spawn(move || run_timer(&*clipboard, &timer_signal, deadline, &copied));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                if let Err(clear_err) = clear_if_unchanged(&*self.clipboard, secret) {
                    tracing::warn!(error = %clear_err, "clipboard clear failed");
                }
                return Err(e.into());
            }
        };

        *pending = Some(PendingClear { signal, handle });
        tracing::debug!(delay_ms = delay.as_millis() as u64, "clipboard clear scheduled");
        Ok(())
    }

    /// Returns `true` while a clear is scheduled and has not run.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// Block until the pending clear (if any) has run.
    pub fn wait(&self) {
        let pending = self.pending.lock().take();
        if let Some(p) = pending {
            if p.handle.join().is_err() {
                tracing::warn!("clipboard timer thread panicked");
            }
        }
    }

    /// Run the pending clear (if any) right away.
    pub fn clear_now(&self) {
        if let Some(p) = self.pending.lock().take() {
            p.finish(TimerState::ClearNow);
        }
    }

    /// Drop the pending clear without touching the clipboard.
    pub fn cancel(&self) {
        if let Some(p) = self.pending.lock().take() {
            p.finish(TimerState::Cancelled);
        }
    }
}

impl Drop for ClipboardGuard {
    fn drop(&mut self) {
        self.clear_now();
    }
}

fn run_timer(clipboard: &dyn Clipboard, signal: &TimerSignal, deadline: Instant, copied: &str) {
    let outcome = {
        let mut state = signal.state.lock();
        while *state == TimerState::Waiting {
            if signal.wake.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        *state
    };

    if outcome == TimerState::Cancelled {
        return;
    }

    match clear_if_unchanged(clipboard, copied) {
        Ok(true) => tracing::debug!("clipboard cleared"),
        Ok(false) => tracing::debug!("clipboard changed since copy, left alone"),
        Err(e) => tracing::warn!(error = %e, "clipboard clear failed"),
    }
}

/// Clear the clipboard only if it still holds `copied`.
fn clear_if_unchanged(clipboard: &dyn Clipboard, copied: &str) -> Result<bool> {
    let current = clipboard.get_text()?;
    let unchanged = current
        .as_ref()
        .is_some_and(|c| bool::from(c.as_bytes().ct_eq(copied.as_bytes())));
    if unchanged {
        clipboard.clear()?;
    }
    Ok(unchanged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(delay: Duration) -> (Arc<MemoryClipboard>, ClipboardGuard) {
        let clipboard = Arc::new(MemoryClipboard::new());
        let guard = ClipboardGuard::with_delay(clipboard.clone(), delay);
        (clipboard, guard)
    }

    #[test]
    fn clear_now_clears_unchanged_secret() {
        let (clipboard, guard) = guard(Duration::from_secs(60));
        guard.copy("s3cret").unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("s3cret"));

        guard.clear_now();
        assert_eq!(clipboard.contents(), None);
        assert!(!guard.is_pending());
    }

    #[test]
    fn cancel_leaves_secret_in_place() {
        let (clipboard, guard) = guard(Duration::from_secs(60));
        guard.copy("s3cret").unwrap();
        guard.cancel();
        assert_eq!(clipboard.contents().as_deref(), Some("s3cret"));
    }

    #[test]
    fn timer_fires_after_delay() {
        let (clipboard, guard) = guard(Duration::from_millis(20));
        guard.copy("s3cret").unwrap();
        guard.wait();
        assert_eq!(clipboard.contents(), None);
    }

    #[test]
    fn drop_runs_pending_clear() {
        let (clipboard, guard) = guard(Duration::from_secs(60));
        guard.copy("s3cret").unwrap();
        drop(guard);
        assert_eq!(clipboard.contents(), None);
    }
}
