//! `agentwallet keygen` — generate an account and encrypt its key.

use std::path::Path;

use ed25519_dalek::SigningKey;
use rand::TryRngCore;
use zeroize::Zeroize;

use crate::cli::{output, prompt_new_password};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::{MemorySessionStore, VaultSession};

/// Execute the `keygen` command.
///
/// Generates a fresh ed25519 keypair, wraps the 64-byte secret (seed
/// followed by public key, the layout wallet databases store) in a
/// vault blob under a freshly chosen password, and prints both the
/// address and the blob.
pub fn execute() -> Result<()> {
    let settings = Settings::load(Path::new("."))?;
    let password = prompt_new_password()?;

    let mut seed = [0u8; 32];
    rand::rngs::OsRng.try_fill_bytes(&mut seed).map_err(|e| {
        crate::errors::AgentWalletError::CommandFailed(format!("system rng failure: {e}"))
    })?;
    let key = SigningKey::from_bytes(&seed);

    let mut keypair = [0u8; 64];
    keypair[..32].copy_from_slice(&seed);
    keypair[32..].copy_from_slice(key.verifying_key().as_bytes());
    seed.zeroize();

    let mut encoded = serde_json::to_string(&keypair.to_vec())
        .map_err(|e| crate::errors::AgentWalletError::SerializationError(e.to_string()))?;
    keypair.zeroize();

    let mut vault = VaultSession::from_settings(MemorySessionStore::new(), &settings);
    vault.unlock(&password)?;
    let blob = vault.encrypt(&encoded)?;
    encoded.zeroize();
    vault.lock()?;

    output::success("Account generated.");
    println!("address: {}", hex::encode(key.verifying_key().as_bytes()));
    println!("blob:    {blob}");
    output::tip("Store the blob wherever your account database lives — it decrypts with the password only.");
    Ok(())
}
