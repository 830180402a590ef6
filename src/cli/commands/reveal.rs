//! `agentwallet reveal` — decrypt a blob and print the plaintext.

use std::path::Path;

use crate::cli::{output, prompt_password};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::{MemorySessionStore, VaultSession};

/// Execute the `reveal` command.
pub fn execute(blob: &str) -> Result<()> {
    let settings = Settings::load(Path::new("."))?;
    let password = prompt_password()?;

    let mut vault = VaultSession::from_settings(MemorySessionStore::new(), &settings);
    vault.unlock(&password)?;
    let plaintext = vault.decrypt(blob)?;
    vault.lock()?;

    output::warning("Printing decrypted secret material to the terminal.");
    println!("{plaintext}");
    Ok(())
}
