//! Integration tests for the wallet-core crypto module.

use agentwallet::crypto::{decrypt, derive_key, encrypt, generate_salt, Pbkdf2Params};
use agentwallet::errors::AgentWalletError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

const PARAMS: Pbkdf2Params = Pbkdf2Params {
    iterations: 600_000,
};

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let blob = encrypt("[1,2,3]", "correct-horse-battery-staple", &PARAMS)
        .expect("encrypt should succeed");

    let recovered = decrypt(&blob, "correct-horse-battery-staple", &PARAMS)
        .expect("decrypt should succeed");
    assert_eq!(recovered, "[1,2,3]");
}

#[test]
fn blob_layout_is_salt_nonce_ciphertext_tag() {
    let plaintext = "layout-check";
    let blob = encrypt(plaintext, "pw-layout", &PARAMS).expect("encrypt");

    let raw = BASE64.decode(&blob).expect("blob is valid base64");
    // 16-byte salt + 12-byte nonce + ciphertext + 16-byte GCM tag.
    assert_eq!(raw.len(), 16 + 12 + plaintext.len() + 16);
}

#[test]
fn encrypt_produces_different_blobs_each_time() {
    let blob1 = encrypt("same-input", "same-password", &PARAMS).expect("encrypt 1");
    let blob2 = encrypt("same-input", "same-password", &PARAMS).expect("encrypt 2");

    // Fresh random salt and nonce per call, so the output must differ.
    assert_ne!(blob1, blob2, "two encryptions of the same input must differ");
}

// ---------------------------------------------------------------------------
// Authentication failures
// ---------------------------------------------------------------------------

#[test]
fn decrypt_with_wrong_password_fails() {
    let blob = encrypt("top secret", "password-one", &PARAMS).expect("encrypt");

    let err = decrypt(&blob, "password-two", &PARAMS).unwrap_err();
    assert!(matches!(err, AgentWalletError::AuthenticationFailed));
}

#[test]
fn flipping_any_region_fails_authentication() {
    let blob = encrypt("tamper-target", "tamper-pw", &PARAMS).expect("encrypt");
    let raw = BASE64.decode(&blob).expect("decode");

    // One byte from each region: salt, nonce, ciphertext body, auth tag.
    for index in [0, 16, 28, raw.len() - 1] {
        let mut tampered = raw.clone();
        tampered[index] ^= 0xFF;
        let tampered_blob = BASE64.encode(&tampered);

        let err = decrypt(&tampered_blob, "tamper-pw", &PARAMS).unwrap_err();
        assert!(
            matches!(err, AgentWalletError::AuthenticationFailed),
            "byte {index} flip must fail authentication, not return plaintext"
        );
    }
}

#[test]
fn decrypt_rejects_malformed_blobs() {
    // Not base64 at all.
    let err = decrypt("!!! not base64 !!!", "pw", &PARAMS).unwrap_err();
    assert!(matches!(err, AgentWalletError::AuthenticationFailed));

    // Valid base64 but shorter than salt + nonce.
    let short = BASE64.encode([0u8; 10]);
    let err = decrypt(&short, "pw", &PARAMS).unwrap_err();
    assert!(matches!(err, AgentWalletError::AuthenticationFailed));

    // Empty string.
    let err = decrypt("", "pw", &PARAMS).unwrap_err();
    assert!(matches!(err, AgentWalletError::AuthenticationFailed));
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derive_key_same_inputs_same_output() {
    let salt = generate_salt().expect("salt");

    let key1 = derive_key(b"my-passphrase", &salt, &PARAMS).expect("derive 1");
    let key2 = derive_key(b"my-passphrase", &salt, &PARAMS).expect("derive 2");

    assert_eq!(key1, key2, "same password + salt must produce the same key");
}

#[test]
fn derive_key_different_salts_different_keys() {
    let salt1 = generate_salt().expect("salt 1");
    let salt2 = generate_salt().expect("salt 2");
    assert_ne!(salt1, salt2, "salts must be random");

    let key1 = derive_key(b"same-password", &salt1, &PARAMS).expect("derive 1");
    let key2 = derive_key(b"same-password", &salt2, &PARAMS).expect("derive 2");

    assert_ne!(key1, key2, "different salts must produce different keys");
}

#[test]
fn derive_key_different_passwords_different_keys() {
    let salt = generate_salt().expect("salt");

    let key1 = derive_key(b"password-one", &salt, &PARAMS).expect("derive 1");
    let key2 = derive_key(b"password-two", &salt, &PARAMS).expect("derive 2");

    assert_ne!(key1, key2, "different passwords must produce different keys");
}

#[test]
fn derive_key_rejects_weak_iteration_counts() {
    let salt = generate_salt().expect("salt");
    let weak = Pbkdf2Params { iterations: 10_000 };

    let err = derive_key(b"pw", &salt, &weak).unwrap_err();
    assert!(matches!(err, AgentWalletError::KeyDerivationFailed(_)));
}
