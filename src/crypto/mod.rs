//! Cryptographic primitives for PassVault.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption with associated data (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - HKDF sub-key derivation and the zeroizing master key (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive, ...};
pub use encryption::{open, seal};
pub use kdf::{derive, generate_salt, KdfParams};
pub use keys::{MasterKey, SubKey};
