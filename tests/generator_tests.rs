//! Password generator properties over many draws.

use std::collections::HashSet;

use passvault::errors::PassVaultError;
use passvault::generator::{
    generate_custom, generate_preset, generate_pronounceable, GeneratorPolicy, Preset, AMBIGUOUS,
    MAX_LENGTH,
};

fn all_classes(len: usize) -> GeneratorPolicy {
    GeneratorPolicy::new(len)
}

#[test]
fn require_each_type_always_covers_every_class() {
    let mut policy = all_classes(16);
    policy.require_each_type = true;

    for _ in 0..200 {
        let pw = generate_custom(&policy).unwrap();
        assert_eq!(pw.chars().count(), 16);
        assert!(pw.chars().any(|c| c.is_ascii_uppercase()), "{pw}");
        assert!(pw.chars().any(|c| c.is_ascii_lowercase()), "{pw}");
        assert!(pw.chars().any(|c| c.is_ascii_digit()), "{pw}");
        assert!(pw.chars().any(|c| c.is_ascii_punctuation()), "{pw}");
    }
}

#[test]
fn exclude_ambiguous_never_yields_lookalikes() {
    let mut policy = all_classes(64);
    policy.exclude_ambiguous = true;

    for _ in 0..100 {
        let pw = generate_custom(&policy).unwrap();
        assert!(
            !pw.chars().any(|c| AMBIGUOUS.contains(c)),
            "ambiguous char in {pw}"
        );
    }
}

#[test]
fn disabled_classes_never_appear() {
    let policy = GeneratorPolicy {
        length: 40,
        upper: false,
        lower: true,
        digits: true,
        symbols: false,
        exclude_ambiguous: false,
        require_each_type: false,
    };

    for _ in 0..100 {
        let pw = generate_custom(&policy).unwrap();
        assert!(pw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}

#[test]
fn output_is_not_repeated() {
    let seen: HashSet<String> = (0..50)
        .map(|_| generate_preset("balanced").unwrap())
        .collect();
    assert_eq!(seen.len(), 50);
}

#[test]
fn every_preset_generates_its_length() {
    for preset in Preset::ALL {
        let policy = preset.policy();
        let pw = generate_preset(preset.name()).unwrap();
        assert_eq!(pw.chars().count(), policy.length, "preset {preset}");
    }
}

#[test]
fn boundary_lengths() {
    assert_eq!(generate_custom(&all_classes(1)).unwrap().len(), 1);
    assert_eq!(
        generate_custom(&all_classes(MAX_LENGTH)).unwrap().len(),
        MAX_LENGTH
    );
    assert!(matches!(
        generate_custom(&all_classes(MAX_LENGTH + 1)),
        Err(PassVaultError::InvalidPolicy(_))
    ));
    assert!(matches!(
        generate_custom(&all_classes(0)),
        Err(PassVaultError::InvalidPolicy(_))
    ));
}

#[test]
fn pronounceable_starts_with_a_consonant_at_any_length() {
    for len in [1, 2, 7, 12, 33] {
        let pw = generate_pronounceable(len).unwrap();
        assert_eq!(pw.len(), len);
        assert!(!"aeiouy".contains(&pw[..1]), "{pw} starts with a vowel");
    }
    assert!(generate_pronounceable(MAX_LENGTH + 1).is_err());
}
