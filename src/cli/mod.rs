//! CLI module — Clap argument parser, output helpers, and command
//! implementations for the developer harness.
//!
//! The harness exercises the wallet core end to end in a terminal:
//! generating an encrypted account, revealing a blob, and walking a
//! full request-approval round trip without the extension UI.

pub mod commands;
pub mod output;

use clap::Parser;
use zeroize::Zeroizing;

use crate::errors::{AgentWalletError, Result};

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Agent wallet developer harness.
#[derive(Parser)]
#[command(
    name = "agentwallet",
    about = "Developer harness for the agent wallet security core",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate an ed25519 account and print its encrypted key blob
    Keygen,

    /// Decrypt a blob and print the plaintext
    Reveal {
        /// The base64 blob to decrypt
        blob: String,
    },

    /// Walk a sign-message request through the approval broker
    Approve {
        /// Message to request a signature over
        #[arg(default_value = "hello from the agent wallet harness")]
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the vault password, trying in order:
/// 1. `AGENTWALLET_PASSWORD` env var (scripted usage)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("AGENTWALLET_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault password")
        .interact()
        .map_err(|e| AgentWalletError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used by `keygen`).
///
/// Also respects `AGENTWALLET_PASSWORD` for scripted usage.
/// Enforces a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("AGENTWALLET_PASSWORD") {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(AgentWalletError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose vault password")
            .with_confirmation("Confirm vault password", "Passwords do not match, try again")
            .interact()
            .map_err(|e| AgentWalletError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}
