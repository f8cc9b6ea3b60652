//! Integration tests for the crypto module.

use passvault::crypto::encryption::{NONCE_LEN, TAG_LEN};
use passvault::crypto::kdf::SALT_LEN;
use passvault::crypto::{derive, generate_salt, open, seal, KdfParams, MasterKey};
use passvault::errors::PassVaultError;

fn key(byte: u8) -> [u8; 32] {
    [byte; 32]
}

#[test]
fn seal_open_roundtrip_with_aad() {
    let sealed = seal(&key(7), b"hunter2", b"context").unwrap();
    assert_eq!(sealed.len(), NONCE_LEN + b"hunter2".len() + TAG_LEN);
    assert_eq!(open(&key(7), &sealed, b"context").unwrap(), b"hunter2");
}

#[test]
fn sealing_twice_uses_fresh_nonces() {
    let a = seal(&key(1), b"same", b"").unwrap();
    let b = seal(&key(1), b"same", b"").unwrap();
    assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    assert_ne!(a, b);
}

#[test]
fn open_fails_closed() {
    let sealed = seal(&key(1), b"payload", b"aad").unwrap();

    // Wrong key.
    assert!(matches!(
        open(&key(2), &sealed, b"aad"),
        Err(PassVaultError::AuthenticationFailure)
    ));
    // Wrong associated data.
    assert!(matches!(
        open(&key(1), &sealed, b"other"),
        Err(PassVaultError::AuthenticationFailure)
    ));
    // Truncated below nonce + tag.
    assert!(matches!(
        open(&key(1), &sealed[..NONCE_LEN + TAG_LEN - 1], b"aad"),
        Err(PassVaultError::AuthenticationFailure)
    ));
    // Any flipped bit.
    for i in 0..sealed.len() {
        let mut bad = sealed.clone();
        bad[i] ^= 0x01;
        assert!(open(&key(1), &bad, b"aad").is_err(), "bit flip at {i} accepted");
    }
}

#[test]
fn derive_is_deterministic_per_salt_and_password() {
    let params = KdfParams::minimum();
    let salt = generate_salt();
    assert_eq!(salt.len(), SALT_LEN);

    let a = derive(b"correct-horse", &salt, &params).unwrap();
    let b = derive(b"correct-horse", &salt, &params).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());

    let other_pw = derive(b"battery-staple", &salt, &params).unwrap();
    assert_ne!(a.as_bytes(), other_pw.as_bytes());

    let other_salt = derive(b"correct-horse", &generate_salt(), &params).unwrap();
    assert_ne!(a.as_bytes(), other_salt.as_bytes());
}

#[test]
fn derive_rejects_weak_parameters() {
    let mut params = KdfParams::minimum();
    params.iterations = 0;
    assert!(derive(b"pw", &generate_salt(), &params).is_err());
}

#[test]
fn sub_keys_are_distinct_and_stable() {
    let master = MasterKey::new([9u8; 32]);
    let envelope = master.envelope_key().unwrap();
    let entry = master.entry_key().unwrap();
    let check = master.key_check_key().unwrap();

    assert_ne!(envelope[..], entry[..]);
    assert_ne!(entry[..], check[..]);
    assert_ne!(envelope[..], master.as_bytes()[..]);
    assert_eq!(master.entry_key().unwrap()[..], entry[..]);
}

#[test]
fn wiped_master_key_is_all_zero() {
    let mut master = MasterKey::new([5u8; 32]);
    assert!(!master.is_wiped());
    master.wipe();
    assert!(master.is_wiped());
    assert_eq!(master.as_bytes(), &[0u8; 32]);
}
