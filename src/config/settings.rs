use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::errors::{PassVaultError, Result};
use crate::generator::Preset;

/// User configuration, loaded from `passvault.toml`.
///
/// Every field has a sensible default so PassVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file location; relative paths resolve against the config
    /// file's directory.
    #[serde(default = "default_vault_path")]
    pub vault_path: PathBuf,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Inactivity before an unlocked session locks itself.
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,

    /// How long a copied secret stays on the clipboard.
    #[serde(default = "default_clipboard_clear_secs")]
    pub clipboard_clear_secs: u64,

    /// Preset used by `generate` when none is given.
    #[serde(default = "default_preset")]
    pub default_preset: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_path() -> PathBuf {
    PathBuf::from("vault.pvlt")
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_auto_lock_secs() -> u64 {
    300
}

fn default_clipboard_clear_secs() -> u64 {
    30
}

fn default_preset() -> String {
    "safe".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            auto_lock_secs: default_auto_lock_secs(),
            clipboard_clear_secs: default_clipboard_clear_secs(),
            default_preset: default_preset(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = "passvault.toml";

    /// Load settings from `<dir>/passvault.toml`.
    ///
    /// If the file does not exist, defaults are returned with relative
    /// paths resolved against `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);
        if !config_path.exists() {
            let mut settings = Self::default();
            settings.vault_path = dir.join(&settings.vault_path);
            return Ok(settings);
        }
        Self::load_file(&config_path)
    }

    /// Load settings from an explicit config file, which must exist.
    pub fn load_file(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            PassVaultError::ConfigError(format!("cannot read {}: {e}", config_path.display()))
        })?;

        let mut settings: Settings = toml::from_str(&contents).map_err(|e| {
            PassVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.vault_path.is_relative() {
            if let Some(base) = config_path.parent() {
                settings.vault_path = base.join(&settings.vault_path);
            }
        }

        settings.validate()?;
        tracing::debug!(config = %config_path.display(), "settings loaded");
        Ok(settings)
    }

    /// Reject values no vault operation could use.
    pub fn validate(&self) -> Result<()> {
        self.kdf_params()
            .validate()
            .map_err(|e| PassVaultError::ConfigError(e.to_string()))?;
        if self.auto_lock_secs == 0 {
            return Err(PassVaultError::ConfigError(
                "auto_lock_secs must be at least 1".into(),
            ));
        }
        self.default_preset
            .parse::<Preset>()
            .map_err(|e| PassVaultError::ConfigError(e.to_string()))?;
        Ok(())
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    pub fn auto_lock(&self) -> Duration {
        Duration::from_secs(self.auto_lock_secs)
    }

    pub fn clipboard_delay(&self) -> Duration {
        Duration::from_secs(self.clipboard_clear_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_path, PathBuf::from("vault.pvlt"));
        assert_eq!(s.argon2_memory_kib, 65_536);
        assert_eq!(s.argon2_iterations, 3);
        assert_eq!(s.argon2_parallelism, 4);
        assert_eq!(s.auto_lock(), Duration::from_secs(300));
        assert_eq!(s.clipboard_delay(), Duration::from_secs(30));
        assert_eq!(s.default_preset, "safe");
        s.validate().unwrap();
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_path, tmp.path().join("vault.pvlt"));
        assert_eq!(settings.auto_lock_secs, 300);
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_path = "secrets/main.pvlt"
argon2_memory_kib = 131072
argon2_iterations = 5
argon2_parallelism = 8
auto_lock_secs = 60
clipboard_clear_secs = 10
default_preset = "balanced"
"#;
        fs::write(tmp.path().join("passvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_path, tmp.path().join("secrets/main.pvlt"));
        assert_eq!(settings.argon2_memory_kib, 131_072);
        assert_eq!(settings.argon2_iterations, 5);
        assert_eq!(settings.argon2_parallelism, 8);
        assert_eq!(settings.auto_lock_secs, 60);
        assert_eq!(settings.clipboard_clear_secs, 10);
        assert_eq!(settings.default_preset, "balanced");
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passvault.toml"), "auto_lock_secs = 120\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.auto_lock_secs, 120);
        assert_eq!(settings.argon2_iterations, 3);
        assert_eq!(settings.default_preset, "safe");
    }

    #[test]
    fn absolute_vault_path_is_kept() {
        let tmp = TempDir::new().unwrap();
        let absolute = tmp.path().join("elsewhere.pvlt");
        let config = format!("vault_path = {:?}\n", absolute.display().to_string());
        fs::write(tmp.path().join("passvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_path, absolute);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passvault.toml"), "not valid {{toml").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(PassVaultError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_out_of_bounds_kdf_cost() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passvault.toml"), "argon2_iterations = 0\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(PassVaultError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_default_preset() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passvault.toml"), "default_preset = \"x\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(Settings::load_file(&tmp.path().join("nope.toml")).is_err());
    }
}
