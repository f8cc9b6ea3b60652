//! Password Generator: presets, custom policies and pronounceable passwords.
//!
//! All randomness comes from `rand::rng()`, a ChaCha-based CSPRNG that is
//! reseeded from the operating system.

mod pronounceable;

use std::fmt;
use std::str::FromStr;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{PassVaultError, Result};

pub use pronounceable::generate_pronounceable;

/// Longest password any policy may ask for.
pub const MAX_LENGTH: usize = 1024;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Characters dropped when `exclude_ambiguous` is set.
pub const AMBIGUOUS: &str = "IOilo01";

/// Shape of a generated password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorPolicy {
    pub length: usize,
    pub upper: bool,
    pub lower: bool,
    pub digits: bool,
    pub symbols: bool,
    pub exclude_ambiguous: bool,
    /// Guarantee at least one character from every selected class.
    pub require_each_type: bool,
}

impl GeneratorPolicy {
    /// All four classes, nothing excluded, nothing required.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            upper: true,
            lower: true,
            digits: true,
            symbols: true,
            exclude_ambiguous: false,
            require_each_type: false,
        }
    }

    /// The character pools of the selected classes, in a fixed order.
    fn classes(&self) -> Vec<Vec<char>> {
        [
            (self.upper, UPPER),
            (self.lower, LOWER),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter(|(selected, _)| *selected)
        .map(|(_, set)| {
            set.chars()
                .filter(|c| !(self.exclude_ambiguous && AMBIGUOUS.contains(*c)))
                .collect()
        })
        .collect()
    }

    /// Check the policy can be satisfied.
    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(PassVaultError::InvalidPolicy(
                "length must be at least 1".into(),
            ));
        }
        if self.length > MAX_LENGTH {
            return Err(PassVaultError::InvalidPolicy(format!(
                "length must be at most {MAX_LENGTH}"
            )));
        }

        let selected = [self.upper, self.lower, self.digits, self.symbols]
            .iter()
            .filter(|s| **s)
            .count();
        if selected == 0 {
            return Err(PassVaultError::InvalidPolicy(
                "select at least one character class".into(),
            ));
        }
        if self.require_each_type && self.length < selected {
            return Err(PassVaultError::InvalidPolicy(format!(
                "length {} is too short to include all {selected} selected classes",
                self.length
            )));
        }
        Ok(())
    }
}

/// Named, fixed generation policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Safe,
    Balanced,
    Fast,
    Pin,
}

impl Preset {
    /// Every preset, in display order.
    pub const ALL: [Preset; 4] = [Preset::Safe, Preset::Balanced, Preset::Fast, Preset::Pin];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Safe => "safe",
            Preset::Balanced => "balanced",
            Preset::Fast => "fast",
            Preset::Pin => "pin",
        }
    }

    pub fn policy(self) -> GeneratorPolicy {
        match self {
            Preset::Safe => GeneratorPolicy {
                exclude_ambiguous: true,
                require_each_type: true,
                ..GeneratorPolicy::new(20)
            },
            Preset::Balanced => GeneratorPolicy::new(16),
            Preset::Fast => GeneratorPolicy {
                symbols: false,
                ..GeneratorPolicy::new(12)
            },
            Preset::Pin => GeneratorPolicy {
                upper: false,
                lower: false,
                symbols: false,
                ..GeneratorPolicy::new(6)
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PassVaultError;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = Preset::ALL.iter().map(|p| p.name()).collect();
                PassVaultError::InvalidPolicy(format!(
                    "unknown preset '{s}' (known: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Generate a password for a named preset.
pub fn generate_preset(name: &str) -> Result<String> {
    generate_custom(&name.parse::<Preset>()?.policy())
}

/// Generate a password under `policy`.
///
/// With `require_each_type`, one slot per selected class is filled from
/// that class first, the rest from the union, and the result is shuffled,
/// so the constraint holds by construction.
pub fn generate_custom(policy: &GeneratorPolicy) -> Result<String> {
    policy.validate()?;

    let classes = policy.classes();
    let union: Vec<char> = classes.iter().flatten().copied().collect();
    let mut rng = rand::rng();

    let mut chars: Vec<char> = Vec::with_capacity(policy.length);
    if policy.require_each_type {
        for class in &classes {
            if let Some(c) = class.choose(&mut rng) {
                chars.push(*c);
            }
        }
    }
    while chars.len() < policy.length {
        chars.push(union[rng.random_range(0..union.len())]);
    }
    chars.shuffle(&mut rng);

    Ok(chars.into_iter().collect())
}
