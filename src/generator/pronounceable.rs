//! Pronounceable passwords built from alternating consonant and vowel units.

use rand::seq::IndexedRandom;

use crate::errors::{PassVaultError, Result};

use super::MAX_LENGTH;

const CONSONANTS: &[&str] = &[
    "b", "c", "d", "f", "g", "h", "j", "k", "l", "m", "n", "p", "r", "s", "t", "v", "w", "z",
    "br", "ch", "cl", "dr", "fl", "gr", "kr", "pl", "sh", "st", "th", "tr",
];

const VOWELS: &[&str] = &[
    "a", "e", "i", "o", "u", "y", "ai", "au", "ea", "ee", "ia", "io", "oa", "oo", "ou",
];

/// Generate a lowercase, speakable password of exactly `length` characters.
///
/// Units alternate consonant, vowel, consonant... starting with a
/// consonant; the last unit is cut short when it would overshoot.
pub fn generate_pronounceable(length: usize) -> Result<String> {
    if length == 0 || length > MAX_LENGTH {
        return Err(PassVaultError::InvalidPolicy(format!(
            "pronounceable length must be between 1 and {MAX_LENGTH}"
        )));
    }

    let mut rng = rand::rng();
    let mut out = String::with_capacity(length + 2);
    let mut consonant = true;

    while out.len() < length {
        let table = if consonant { CONSONANTS } else { VOWELS };
        if let Some(unit) = table.choose(&mut rng) {
            out.push_str(unit);
        }
        consonant = !consonant;
    }

    // Every unit is ASCII, so byte length equals character count.
    out.truncate(length);
    Ok(out)
}
