//! Vault module: encrypted credential storage.
//!
//! This module provides:
//! - `Entry`, `EntryId` and friends (`entry`)
//! - Per-entry authenticated sealing (`codec`)
//! - Binary vault file format, key check and staged writes (`format`)
//! - Path-based `VaultStore` for creating, unlocking and editing vaults (`store`)

pub mod codec;
pub mod entry;
pub mod format;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{Entry, EntryFields, EntryId, EntryPatch, EntrySummary};
pub use format::VaultHeader;
pub use store::{NewKey, VaultStore};
