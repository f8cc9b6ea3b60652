//! Key derivation helpers using HKDF-SHA256.
//!
//! From the Argon2id master key we derive independent sub-keys:
//! - an **envelope** key sealing the whole entry collection,
//! - an **entry** key sealing each entry's secret fields,
//! - a **key-check** key proving the password is right before any
//!   ciphertext is touched.
//!
//! HKDF (RFC 5869) uses the master key as input keying material (IKM)
//! and a context string (`info`) to produce each sub-key.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{PassVaultError, Result};

/// Length of the master key and every derived sub-key (256 bits).
pub const KEY_LEN: usize = 32;

const ENVELOPE_INFO: &[u8] = b"passvault-envelope-key";
const ENTRY_INFO: &[u8] = b"passvault-entry-key";
const KEY_CHECK_INFO: &[u8] = b"passvault-key-check";

/// A sub-key that wipes itself when it goes out of scope.
pub type SubKey = Zeroizing<[u8; KEY_LEN]>;

/// Run HKDF-SHA256 expand with the given `info`.
///
/// The extract step uses a zero salt; the IKM already has full entropy
/// because it came out of Argon2id.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<SubKey> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(info, &mut okm[..])
        .map_err(|e| PassVaultError::EncryptionFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// The derived master key of an unlocked vault.
///
/// Memory is overwritten on drop, and `wipe` can be called to overwrite
/// it earlier. Deliberately not `Clone`: a session owns exactly one copy.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub(crate) fn zeroed() -> Self {
        Self {
            bytes: [0u8; KEY_LEN],
        }
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; KEY_LEN] {
        &mut self.bytes
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Overwrite the key material in place.
    pub fn wipe(&mut self) {
        self.bytes.zeroize();
    }

    /// Returns `true` once the key has been wiped.
    pub fn is_wiped(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    /// Sub-key for the whole-vault envelope.
    pub fn envelope_key(&self) -> Result<SubKey> {
        hkdf_derive(&self.bytes, ENVELOPE_INFO)
    }

    /// Sub-key for individual entry blobs.
    pub fn entry_key(&self) -> Result<SubKey> {
        hkdf_derive(&self.bytes, ENTRY_INFO)
    }

    /// Sub-key for the header's password check value.
    pub fn key_check_key(&self) -> Result<SubKey> {
        hkdf_derive(&self.bytes, KEY_CHECK_INFO)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}
