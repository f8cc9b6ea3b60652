//! Entry Codec: one credential <-> one authenticated blob.
//!
//! Blob layout:
//!
//! ```text
//! [codec version: 1][entry id: 16][nonce: 12][ciphertext + tag: n + 16]
//! ```
//!
//! The version byte and entry id travel in the clear and are bound into
//! the AEAD associated data, so a blob cannot be replayed under another
//! entry's id or reinterpreted under another codec version.

use zeroize::Zeroizing;

use crate::crypto::encryption::{self, NONCE_LEN, TAG_LEN};
use crate::crypto::MasterKey;
use crate::errors::{PassVaultError, Result};

use super::entry::Entry;

/// Current entry codec version.
pub const CODEC_VERSION: u8 = 1;

const AAD_PREFIX: &[u8] = b"passvault-entry";
const ID_LEN: usize = 16;
const PREFIX_LEN: usize = 1 + ID_LEN;

fn associated_data(version: u8, id: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AAD_PREFIX.len() + 1 + ID_LEN);
    aad.extend_from_slice(AAD_PREFIX);
    aad.push(version);
    aad.extend_from_slice(id);
    aad
}

/// Seal an entry under the vault key. Every call uses a fresh nonce.
pub fn seal(entry: &Entry, key: &MasterKey) -> Result<Vec<u8>> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(entry)
            .map_err(|e| PassVaultError::SerializationError(format!("entry: {e}")))?,
    );

    let entry_key = key.entry_key()?;
    let aad = associated_data(CODEC_VERSION, entry.id.as_bytes());
    let sealed = encryption::seal(&entry_key[..], &plaintext, &aad)?;

    let mut blob = Vec::with_capacity(PREFIX_LEN + sealed.len());
    blob.push(CODEC_VERSION);
    blob.extend_from_slice(entry.id.as_bytes());
    blob.extend_from_slice(&sealed);
    Ok(blob)
}

/// Open a blob produced by `seal`.
///
/// Any truncation, version mismatch, tag mismatch or id mismatch yields
/// `AuthenticationFailure` and no plaintext.
pub fn open(blob: &[u8], key: &MasterKey) -> Result<Entry> {
    if blob.len() < PREFIX_LEN + NONCE_LEN + TAG_LEN {
        return Err(PassVaultError::AuthenticationFailure);
    }
    if blob[0] != CODEC_VERSION {
        return Err(PassVaultError::AuthenticationFailure);
    }

    let id_bytes = &blob[1..PREFIX_LEN];
    let entry_key = key.entry_key()?;
    let aad = associated_data(blob[0], id_bytes);
    let plaintext = Zeroizing::new(encryption::open(
        &entry_key[..],
        &blob[PREFIX_LEN..],
        &aad,
    )?);

    let entry: Entry = serde_json::from_slice(&plaintext)
        .map_err(|e| PassVaultError::SerializationError(format!("entry: {e}")))?;

    if entry.id.as_bytes().as_slice() != id_bytes {
        return Err(PassVaultError::AuthenticationFailure);
    }
    Ok(entry)
}
