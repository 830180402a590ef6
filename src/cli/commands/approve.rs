//! `agentwallet approve` — full request-approval round trip.
//!
//! A worker thread plays the untrusted page: it parks a sign-message
//! request in the broker and blocks on its ticket.  The main thread
//! plays the approval surface: it shows the pending payload, asks the
//! operator to approve or reject, and settles the slot.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use rand::TryRngCore;
use zeroize::Zeroize;

use crate::accounts::{MemoryAccountStore, WalletAccount};
use crate::cli::{output, prompt_new_password};
use crate::config::Settings;
use crate::errors::{AgentWalletError, Result};
use crate::request::types::{RequestOutcome, RequestPayload, SignMessageInput};
use crate::request::{CreateOutcome, RequestBroker};
use crate::service;
use crate::signing::{NullTransactionBackend, SignService};
use crate::vault::{MemorySessionStore, VaultSession};

/// Execute the `approve` command.
pub fn execute(message: &str) -> Result<()> {
    let settings = Settings::load(Path::new("."))?;
    let password = prompt_new_password()?;

    // Stand in for the extension database: one account, one blob.
    let mut seed = [0u8; 32];
    rand::rngs::OsRng
        .try_fill_bytes(&mut seed)
        .map_err(|e| AgentWalletError::CommandFailed(format!("system rng failure: {e}")))?;
    let key = SigningKey::from_bytes(&seed);

    let mut keypair = [0u8; 64];
    keypair[..32].copy_from_slice(&seed);
    keypair[32..].copy_from_slice(key.verifying_key().as_bytes());
    seed.zeroize();

    let mut encoded = serde_json::to_string(&keypair.to_vec())
        .map_err(|e| AgentWalletError::SerializationError(e.to_string()))?;
    keypair.zeroize();

    let mut vault = VaultSession::from_settings(MemorySessionStore::new(), &settings);
    vault.unlock(&password)?;
    let blob = vault.encrypt(&encoded)?;
    encoded.zeroize();

    let accounts = Arc::new(MemoryAccountStore::new());
    accounts.add_account(WalletAccount {
        address: hex::encode(key.verifying_key().as_bytes()),
        public_key: key.verifying_key().as_bytes().to_vec(),
        label: Some("harness".into()),
    });
    accounts.set_active_secret(blob);

    let broker = Arc::new(RequestBroker::new(Arc::clone(&accounts)));
    let signer = SignService::new(
        Arc::new(Mutex::new(vault)),
        Arc::clone(&accounts),
        Arc::new(NullTransactionBackend),
    )
    .with_settings(&settings);

    // The page context: create the request and wait for settlement.
    let page_broker = Arc::clone(&broker);
    let payload = RequestPayload::SignMessage(vec![SignMessageInput {
        message: message.as_bytes().to_vec(),
    }]);
    let waiter = thread::spawn(move || -> Result<RequestOutcome> {
        match page_broker.create(payload)? {
            CreateOutcome::Pending(ticket) => ticket.wait(),
            CreateOutcome::Connected(_) => Err(AgentWalletError::CommandFailed(
                "sign-message request settled as connect".into(),
            )),
        }
    });

    // The approval surface: wait for the slot to fill, then decide.
    let snapshot = loop {
        if let Some(snapshot) = broker.get() {
            break snapshot;
        }
        thread::sleep(Duration::from_millis(10));
    };

    output::info(&format!(
        "Pending {} request created at {}",
        snapshot.kind,
        snapshot.created_at.format("%H:%M:%S")
    ));
    println!("message: {message:?}");

    let approved = dialoguer::Confirm::new()
        .with_prompt("Approve this request?")
        .default(true)
        .interact()
        .map_err(|e| AgentWalletError::CommandFailed(format!("approval prompt: {e}")))?;

    if approved {
        service::approve_pending(broker.as_ref(), &signer)?;
    } else {
        broker.reject()?;
    }

    // Back on the page side: report what the caller saw.
    match waiter.join() {
        Ok(Ok(RequestOutcome::SignMessage(outputs))) => {
            output::success("Request resolved.");
            for out in outputs {
                println!("signature: {}", hex::encode(&out.signature));
            }
        }
        Ok(Ok(_)) => output::warning("Request resolved with an unexpected outcome kind."),
        Ok(Err(e)) => output::warning(&format!("Request settled with: {e}")),
        Err(_) => {
            return Err(AgentWalletError::CommandFailed(
                "request thread panicked".into(),
            ))
        }
    }

    Ok(())
}
