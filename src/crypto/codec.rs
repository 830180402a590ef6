//! Password-keyed authenticated encryption of self-contained blobs.
//!
//! Each call to `encrypt` generates a fresh random 16-byte salt and
//! 12-byte nonce, derives an AES-256 key with PBKDF2, and seals the
//! plaintext with AES-256-GCM.  The result is base64 so it can travel
//! through JSON and message ports unchanged.
//!
//! Layout of the packed bytes before base64 encoding:
//!   [ 16-byte salt | 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! The offsets are fixed and positional.  Changing them breaks every
//! previously stored blob, so they are not negotiable.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use crate::errors::{AgentWalletError, Result};

use super::kdf::{derive_key, generate_salt, Pbkdf2Params, SALT_LEN};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` under `password` and return a base64 blob.
///
/// The blob embeds its own salt and nonce, so it is decryptable with
/// nothing but the password.  Two calls with identical inputs never
/// produce the same blob — freshness comes from the random generator,
/// not a counter.
pub fn encrypt(plaintext: &str, password: &str, params: &Pbkdf2Params) -> Result<String> {
    let salt = generate_salt()?;
    let mut key = derive_key(password.as_bytes(), &salt, params)?;

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| AgentWalletError::EncryptionFailed(format!("invalid key length: {e}")))?;
    key.zeroize();

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| AgentWalletError::EncryptionFailed(format!("encryption error: {e}")))?;

    // Pack salt || nonce || ciphertext so the caller stores one string.
    let mut packed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    packed.extend_from_slice(&salt);
    packed.extend_from_slice(&nonce);
    packed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(&packed))
}

/// Decrypt a blob produced by `encrypt`.
///
/// Every data-dependent failure — malformed base64, truncation, auth
/// tag mismatch, non-UTF-8 plaintext — collapses into the single
/// `AuthenticationFailed` error.  A caller cannot tell a wrong
/// password from a corrupted blob, and must not be able to.
pub fn decrypt(blob: &str, password: &str, params: &Pbkdf2Params) -> Result<String> {
    let raw = BASE64
        .decode(blob)
        .map_err(|_| AgentWalletError::AuthenticationFailed)?;

    if raw.len() < SALT_LEN + NONCE_LEN {
        return Err(AgentWalletError::AuthenticationFailed);
    }

    // Split by the fixed offsets: salt, then nonce, then ciphertext.
    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    // Re-derive the key from the embedded salt.  Parameter validation
    // errors propagate as-is — they are configuration mistakes, not
    // data-dependent failures.
    let mut key = derive_key(password.as_bytes(), salt, params)?;

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| AgentWalletError::AuthenticationFailed)?;
    key.zeroize();

    let nonce = Nonce::from_slice(nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| AgentWalletError::AuthenticationFailed)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        AgentWalletError::AuthenticationFailed
    })
}
