//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is configurable via `Pbkdf2Params` (loaded from
//! `agentwallet.toml` or sensible defaults) but never allowed below the
//! 600k floor — blobs written with a weak KDF would be cheap to brute
//! force offline.

use pbkdf2::pbkdf2_hmac;
use rand::TryRngCore;
use sha2::Sha256;

use crate::errors::{AgentWalletError, Result};

/// Length of the salt embedded in every blob (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
const KEY_LEN: usize = 32;

/// Minimum allowed PBKDF2 iteration count.
pub const MIN_ITERATIONS: u32 = 600_000;

/// Configurable PBKDF2 parameters.
///
/// Maps 1:1 to the `pbkdf2_iterations` field in `Settings` so the
/// harness can pass whatever the user configured.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2Params {
    /// Number of PBKDF2 rounds (default: 600 000).
    pub iterations: u32,
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self {
            iterations: MIN_ITERATIONS,
        }
    }
}

/// Derive a 32-byte AES key from a password and salt.
///
/// Pure function: the same password + salt + iteration count always
/// produce the same key. Rejects iteration counts below the floor.
pub fn derive_key(password: &[u8], salt: &[u8], params: &Pbkdf2Params) -> Result<[u8; KEY_LEN]> {
    if params.iterations < MIN_ITERATIONS {
        return Err(AgentWalletError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {})",
            params.iterations
        )));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, params.iterations, &mut key);
    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
///
/// Fails only when the OS randomness source does.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| AgentWalletError::KeyDerivationFailed(format!("system rng failure: {e}")))?;
    Ok(salt)
}
