//! Cryptographic primitives for the wallet core.
//!
//! This module provides:
//! - Password-keyed AES-256-GCM blob encryption and decryption (`codec`)
//! - PBKDF2-HMAC-SHA256 key derivation (`kdf`)

pub mod codec;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use codec::{decrypt, encrypt, NONCE_LEN};
pub use kdf::{derive_key, generate_salt, Pbkdf2Params, MIN_ITERATIONS, SALT_LEN};
