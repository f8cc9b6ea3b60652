use std::path::PathBuf;
use thiserror::Error;

use crate::vault::EntryId;

/// All errors that can occur in PassVault.
#[derive(Debug, Error)]
pub enum PassVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The master password did not match the vault's key check.
    #[error("Wrong master password or damaged vault")]
    WrongPassword,

    /// An entry blob failed authentication (tag mismatch, truncation or
    /// version mismatch). Treated as possible tampering.
    #[error("Entry authentication failed, the vault data may have been tampered with")]
    AuthenticationFailure,

    #[error("Invalid key derivation parameters: {0}")]
    InvalidParameters(String),

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("A file already exists at {0}")]
    PathExists(PathBuf),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    /// The key check passed but the envelope did not authenticate.
    #[error("Vault envelope is corrupt: {0}")]
    CorruptVault(String),

    #[error("Entry {0} not found")]
    NotFound(EntryId),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Vault is locked")]
    VaultLocked,

    // --- Generator errors ---
    #[error("Invalid password policy: {0}")]
    InvalidPolicy(String),

    // --- Clipboard errors ---
    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// How a failure should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Nothing changed; the user can simply try again.
    Retry,
    /// Stored data failed authentication and may be at risk.
    DataAtRisk,
    /// Filesystem or platform failure; the caller may retry.
    Transient,
    /// The caller passed something the core cannot accept.
    Misuse,
}

impl PassVaultError {
    /// Classify the error for display. Kinds are never merged: a wrong
    /// password and a tampered entry always land in different categories.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::WrongPassword
            | Self::NotFound(_)
            | Self::VaultLocked
            | Self::VaultNotFound(_)
            | Self::PathExists(_)
            | Self::UserCancelled => ErrorCategory::Retry,
            Self::AuthenticationFailure | Self::CorruptVault(_) | Self::InvalidVaultFormat(_) => {
                ErrorCategory::DataAtRisk
            }
            Self::Io(_) | Self::ClipboardError(_) | Self::AuditError(_) => ErrorCategory::Transient,
            Self::InvalidPolicy(_)
            | Self::InvalidParameters(_)
            | Self::InvalidEntry(_)
            | Self::EncryptionFailed(_)
            | Self::SerializationError(_)
            | Self::ConfigError(_)
            | Self::CommandFailed(_) => ErrorCategory::Misuse,
        }
    }
}

/// Convenience type alias for PassVault results.
pub type Result<T> = std::result::Result<T, PassVaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_and_tampering_are_distinct_categories() {
        assert_eq!(PassVaultError::WrongPassword.category(), ErrorCategory::Retry);
        assert_eq!(
            PassVaultError::AuthenticationFailure.category(),
            ErrorCategory::DataAtRisk
        );
        assert_ne!(
            PassVaultError::WrongPassword.to_string(),
            PassVaultError::AuthenticationFailure.to_string()
        );
    }

    #[test]
    fn io_errors_are_transient() {
        let err: PassVaultError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.category(), ErrorCategory::Transient);
    }
}
