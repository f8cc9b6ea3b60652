//! Binary vault file format, key check and staged atomic writes.
//!
//! A `.pvlt` file has this layout:
//!
//! ```text
//! [PVLT: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][envelope]
//! ```
//!
//! - **Magic** (`PVLT`): identifies the file as a PassVault vault.
//! - **Version**: format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the envelope begins.
//! - **Header JSON**: serialized `VaultHeader` (KDF algorithm and cost,
//!   salt, key check). Everything needed to re-derive the key.
//! - **Envelope**: `nonce || AES-256-GCM(records JSON)`, with the exact
//!   header bytes as associated data so the header cannot be edited
//!   without breaking authentication.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tempfile::NamedTempFile;
use zeroize::Zeroizing;

use crate::crypto::encryption;
use crate::crypto::kdf::{KdfParams, KDF_ALGORITHM, SALT_LEN};
use crate::crypto::MasterKey;
use crate::errors::{PassVaultError, Result};

use super::entry::EntryId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

/// Smallest possible envelope: nonce + tag.
const MIN_ENVELOPE_LEN: usize = encryption::NONCE_LEN + encryption::TAG_LEN;

/// Upper bound on the header JSON; real headers are a few hundred bytes.
const MAX_HEADER_LEN: usize = 64 * 1024;

const KEY_CHECK_CONTEXT: &[u8] = b"passvault-key-check-v1";

// ---------------------------------------------------------------------------
// Header and records
// ---------------------------------------------------------------------------

/// Which KDF produced the key, and at what cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfDescriptor {
    pub algorithm: String,
    #[serde(flatten)]
    pub params: KdfParams,
}

/// Metadata stored at the beginning of a vault file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultHeader {
    /// Format version.
    pub version: u8,

    /// KDF algorithm and cost parameters used at creation.
    pub kdf: KdfDescriptor,

    /// The salt used for Argon2id key derivation (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// HMAC proving a derived key is the right one (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub key_check: Vec<u8>,

    /// When this vault was first created.
    pub created_at: DateTime<Utc>,
}

impl VaultHeader {
    /// Build a header for a freshly derived key.
    pub fn new(salt: &[u8], params: KdfParams, key: &MasterKey) -> Result<Self> {
        let key_check = compute_key_check(key, salt, &params)?;
        Ok(Self {
            version: CURRENT_VERSION,
            kdf: KdfDescriptor {
                algorithm: KDF_ALGORITHM.to_string(),
                params,
            },
            salt: salt.to_vec(),
            key_check,
            created_at: Utc::now(),
        })
    }

    /// Reject headers this build cannot derive a key for.
    pub fn validate(&self) -> Result<()> {
        if self.version != CURRENT_VERSION {
            return Err(PassVaultError::InvalidVaultFormat(format!(
                "unsupported header version {}, expected {CURRENT_VERSION}",
                self.version
            )));
        }
        if self.kdf.algorithm != KDF_ALGORITHM {
            return Err(PassVaultError::InvalidVaultFormat(format!(
                "unsupported KDF '{}'",
                self.kdf.algorithm
            )));
        }
        if self.salt.len() != SALT_LEN {
            return Err(PassVaultError::InvalidVaultFormat(format!(
                "salt must be {SALT_LEN} bytes, found {}",
                self.salt.len()
            )));
        }
        self.kdf.params.validate()
    }
}

/// One entry as stored inside the envelope.
///
/// Only `id`, `title` and timestamps are readable after the envelope is
/// opened; the credential itself stays in `sealed` until explicitly read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: EntryId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub sealed: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Key check
// ---------------------------------------------------------------------------

fn key_check_mac(key: &MasterKey, salt: &[u8], params: &KdfParams) -> Result<Hmac<Sha256>> {
    let check_key = key.key_check_key()?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&check_key[..])
        .map_err(|e| PassVaultError::EncryptionFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(KEY_CHECK_CONTEXT);
    mac.update(salt);
    mac.update(&params.memory_kib.to_le_bytes());
    mac.update(&params.iterations.to_le_bytes());
    mac.update(&params.parallelism.to_le_bytes());
    Ok(mac)
}

/// Compute the key check value stored in the header.
pub fn compute_key_check(key: &MasterKey, salt: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
    Ok(key_check_mac(key, salt, params)?
        .finalize()
        .into_bytes()
        .to_vec())
}

/// Verify a derived key against the header in constant time.
///
/// A mismatch means the password was wrong.
pub fn verify_key_check(key: &MasterKey, header: &VaultHeader) -> Result<()> {
    key_check_mac(key, &header.salt, &header.kdf.params)?
        .verify_slice(&header.key_check)
        .map_err(|_| PassVaultError::WrongPassword)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// A fully encrypted vault image sitting in a temp file next to its
/// target, not yet visible at the target path.
///
/// Dropping it without `commit` deletes the temp file, so every failure
/// path leaves the previous vault untouched and no stray files behind.
pub struct StagedVault {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedVault {
    /// Path of the staged temp file.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically swap the staged file into place.
    pub fn commit(self) -> Result<()> {
        let Self { temp, target } = self;
        temp.persist(&target).map_err(|e| PassVaultError::Io(e.error))?;
        sync_parent_dir(&target);
        Ok(())
    }

    /// Swap the staged file into place only if nothing exists at the
    /// target yet.
    pub fn commit_new(self) -> Result<()> {
        let Self { temp, target } = self;
        temp.persist_noclobber(&target).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                PassVaultError::PathExists(target.clone())
            } else {
                PassVaultError::Io(e.error)
            }
        })?;
        sync_parent_dir(&target);
        Ok(())
    }

    /// Leave the temp file on disk without swapping it in, exactly as a
    /// crash between staging and commit would.
    pub fn abandon(self) -> Result<PathBuf> {
        self.temp
            .into_temp_path()
            .keep()
            .map_err(|e| PassVaultError::Io(e.error))
    }
}

/// Serialize, encrypt and stage a vault image next to `path`.
///
/// 1. Serialize header and records to JSON.
/// 2. Seal the records under the envelope key, header bytes as AAD.
/// 3. Write everything to a temp file in the same directory and flush
///    it to disk.
pub fn stage_vault(
    path: &Path,
    header: &VaultHeader,
    records: &[EntryRecord],
    key: &MasterKey,
) -> Result<StagedVault> {
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| PassVaultError::SerializationError(format!("header: {e}")))?;
    let records_bytes = Zeroizing::new(
        serde_json::to_vec(records)
            .map_err(|e| PassVaultError::SerializationError(format!("records: {e}")))?,
    );

    let envelope_key = key.envelope_key()?;
    let envelope = encryption::seal(&envelope_key[..], &records_bytes, &header_bytes)?;

    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        PassVaultError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;
    let total = PREFIX_LEN + header_bytes.len() + envelope.len();
    let mut buf = Vec::with_capacity(total);

    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&header_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&header_bytes); // header JSON
    buf.extend_from_slice(&envelope); // nonce + ciphertext + tag

    // Same directory as the target so the final rename stays on one
    // filesystem.
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(parent)?;

    temp.write_all(&buf)?;
    temp.as_file().sync_all()?;

    tracing::debug!(
        target = %path.display(),
        staged = %temp.path().display(),
        records = records.len(),
        "staged vault image"
    );

    Ok(StagedVault {
        temp,
        target: path.to_path_buf(),
    })
}

/// Write a vault file to disk **atomically** (stage, then swap).
pub fn write_vault(
    path: &Path,
    header: &VaultHeader,
    records: &[EntryRecord],
    key: &MasterKey,
) -> Result<()> {
    stage_vault(path, header, records, key)?.commit()
}

/// Flush the directory holding a freshly swapped file. Failures are
/// logged and reported as `false`; the swap itself has already happened.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> bool {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match fs::File::open(parent).and_then(|dir| dir.sync_all()) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(dir = %parent.display(), error = %e, "directory fsync after swap failed");
            false
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> bool {
    true
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Raw data read from a vault file on disk.
///
/// Keeps the header bytes as read so the envelope is authenticated
/// against exactly what was written, with no re-serialization.
pub struct RawVault {
    pub header: VaultHeader,
    /// The raw header JSON bytes exactly as stored on disk.
    pub header_bytes: Vec<u8>,
    /// Nonce + ciphertext + tag.
    pub envelope: Vec<u8>,
}

impl RawVault {
    /// Decrypt the envelope and return its records.
    ///
    /// The caller must already have passed `verify_key_check`; a failure
    /// here therefore means the file is corrupt, not that the password
    /// is wrong.
    pub fn open_records(&self, key: &MasterKey) -> Result<Vec<EntryRecord>> {
        let envelope_key = key.envelope_key()?;
        let plaintext = Zeroizing::new(
            encryption::open(&envelope_key[..], &self.envelope, &self.header_bytes).map_err(
                |_| PassVaultError::CorruptVault("envelope failed authentication".into()),
            )?,
        );

        serde_json::from_slice(&plaintext)
            .map_err(|e| PassVaultError::CorruptVault(format!("records JSON: {e}")))
    }
}

/// Read a vault file from disk and split it into its parts.
pub fn read_vault(path: &Path) -> Result<RawVault> {
    if !path.exists() {
        return Err(PassVaultError::VaultNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;

    if data.len() < PREFIX_LEN + MIN_ENVELOPE_LEN {
        return Err(PassVaultError::InvalidVaultFormat(
            "file too small to be a valid vault".into(),
        ));
    }

    // --- Parse the fixed-size prefix ---

    if &data[0..4] != MAGIC {
        return Err(PassVaultError::InvalidVaultFormat(
            "missing PVLT magic bytes".into(),
        ));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(PassVaultError::InvalidVaultFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| PassVaultError::InvalidVaultFormat("bad header length".into()))?,
    );
    let header_len = usize::try_from(header_len_u32).map_err(|_| {
        PassVaultError::InvalidVaultFormat(format!(
            "header length {header_len_u32} exceeds platform address space"
        ))
    })?;
    if header_len > MAX_HEADER_LEN {
        return Err(PassVaultError::InvalidVaultFormat(format!(
            "header length {header_len} is implausibly large"
        )));
    }

    let header_end = PREFIX_LEN + header_len;
    if header_end + MIN_ENVELOPE_LEN > data.len() {
        return Err(PassVaultError::InvalidVaultFormat(
            "header length exceeds file size".into(),
        ));
    }

    let header_bytes = data[PREFIX_LEN..header_end].to_vec();
    let envelope = data[header_end..].to_vec();

    let header: VaultHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| PassVaultError::InvalidVaultFormat(format!("header JSON: {e}")))?;
    header.validate()?;

    Ok(RawVault {
        header,
        header_bytes,
        envelope,
    })
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
