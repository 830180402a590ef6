//! The signing service: the composition of vault and account store
//! that actually touches key material.
//!
//! Message and sign-in signatures are produced in-process with
//! ed25519.  Transaction construction and broadcast belong to the RPC
//! layer outside this crate, so those two operations delegate to an
//! injected `TransactionBackend`.
//!
//! Decrypted key bytes live in `Zeroizing` buffers and are wiped as
//! soon as each operation completes.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use zeroize::Zeroizing;

use crate::accounts::AccountSource;
use crate::config::Settings;
use crate::errors::{AgentWalletError, Result};
use crate::request::types::{
    ConnectOutput, SignAndSendTransactionInput, SignAndSendTransactionOutput, SignInInput,
    SignInOutput, SignMessageInput, SignMessageOutput, SignTransactionInput,
    SignTransactionOutput,
};
use crate::vault::{SessionStore, VaultSession};

/// Transaction signing and submission, provided by the RPC layer.
pub trait TransactionBackend: Send + Sync {
    /// Sign a serialized transaction, returning the signed bytes.
    fn sign_transaction(&self, secret_key: &[u8], transaction: &[u8]) -> Result<Vec<u8>>;

    /// Sign and broadcast a serialized transaction, returning the
    /// transaction signature.
    fn sign_and_send_transaction(&self, secret_key: &[u8], transaction: &[u8]) -> Result<Vec<u8>>;
}

/// Backend for deployments without an RPC layer (tests, harness).
/// Both operations fail.
pub struct NullTransactionBackend;

impl TransactionBackend for NullTransactionBackend {
    fn sign_transaction(&self, _secret_key: &[u8], _transaction: &[u8]) -> Result<Vec<u8>> {
        Err(AgentWalletError::SigningFailed(
            "no transaction backend configured".into(),
        ))
    }

    fn sign_and_send_transaction(&self, _secret_key: &[u8], _transaction: &[u8]) -> Result<Vec<u8>> {
        Err(AgentWalletError::SigningFailed(
            "no transaction backend configured".into(),
        ))
    }
}

/// Signing operations over the active account's key, gated by the vault.
pub struct SignService<S: SessionStore, A: AccountSource> {
    vault: Arc<Mutex<VaultSession<S>>>,
    accounts: Arc<A>,
    backend: Arc<dyn TransactionBackend>,
    accept_legacy_plaintext: bool,
}

impl<S: SessionStore, A: AccountSource> SignService<S, A> {
    pub fn new(
        vault: Arc<Mutex<VaultSession<S>>>,
        accounts: Arc<A>,
        backend: Arc<dyn TransactionBackend>,
    ) -> Self {
        Self {
            vault,
            accounts,
            backend,
            accept_legacy_plaintext: false,
        }
    }

    /// Apply the legacy-plaintext setting (see `Settings`).
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.accept_legacy_plaintext = settings.accept_legacy_plaintext;
        self
    }

    /// Answer a connect request from the account source.
    pub fn connect(&self) -> Result<ConnectOutput> {
        let accounts = self.accounts.wallet_accounts()?;
        Ok(ConnectOutput { accounts })
    }

    /// Sign each message with the active account's key.
    pub fn sign_message(&self, inputs: &[SignMessageInput]) -> Result<Vec<SignMessageOutput>> {
        let secret = self.secret_key_bytes()?;
        let key = signing_key(&secret)?;

        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let signature = key.sign(&input.message);
            results.push(SignMessageOutput {
                signature: signature.to_bytes().to_vec(),
                signed_message: input.message.clone(),
            });
        }
        Ok(results)
    }

    /// Build and sign a sign-in message for each input.
    ///
    /// Domain and address fall back to "agent" and the active account,
    /// matching what a page gets when it passes neither.
    pub fn sign_in(&self, inputs: &[SignInInput]) -> Result<Vec<SignInOutput>> {
        let account = self.accounts.active_account()?;
        let secret = self.secret_key_bytes()?;
        let key = signing_key(&secret)?;

        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let domain = input.domain.as_deref().unwrap_or("agent");
            let address = input.address.as_deref().unwrap_or(&account.address);
            let message = sign_in_message(domain, address, input.statement.as_deref());

            let signature = key.sign(message.as_bytes());
            results.push(SignInOutput {
                account: account.clone(),
                signed_message: message.into_bytes(),
                signature: signature.to_bytes().to_vec(),
            });
        }
        Ok(results)
    }

    /// Sign each transaction through the backend.
    pub fn sign_transaction(
        &self,
        inputs: &[SignTransactionInput],
    ) -> Result<Vec<SignTransactionOutput>> {
        let secret = self.secret_key_bytes()?;

        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let signed_transaction = self.backend.sign_transaction(&secret, &input.transaction)?;
            results.push(SignTransactionOutput { signed_transaction });
        }
        Ok(results)
    }

    /// Sign and broadcast each transaction through the backend.
    pub fn sign_and_send_transaction(
        &self,
        inputs: &[SignAndSendTransactionInput],
    ) -> Result<Vec<SignAndSendTransactionOutput>> {
        let secret = self.secret_key_bytes()?;

        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let signature = self
                .backend
                .sign_and_send_transaction(&secret, &input.transaction)?;
            results.push(SignAndSendTransactionOutput { signature });
        }
        Ok(results)
    }

    /// Whether the vault is currently locked.
    pub fn is_locked(&self) -> bool {
        self.lock_vault().is_locked()
    }

    /// Decrypt the active account's secret key through the vault.
    ///
    /// The blob holds a JSON byte array (the storage format the
    /// extension database uses for key material).  When
    /// `accept_legacy_plaintext` is enabled, a blob that fails
    /// authenticated decryption is re-read as raw plaintext JSON —
    /// a migration shim for keys stored before vault setup, NOT a
    /// security feature.
    fn secret_key_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        let blob = self.accounts.active_account_secret()?;

        let decrypted = {
            let mut vault = self.lock_vault();
            match vault.decrypt(&blob) {
                Ok(plaintext) => Zeroizing::new(plaintext),
                Err(AgentWalletError::AuthenticationFailed) if self.accept_legacy_plaintext => {
                    tracing::warn!(
                        "secret key blob failed authenticated decryption, \
                         falling back to legacy plaintext"
                    );
                    Zeroizing::new(blob)
                }
                Err(e) => return Err(e),
            }
        };

        let bytes: Vec<u8> = serde_json::from_str(&decrypted).map_err(|_| {
            AgentWalletError::SigningFailed("secret key is not a JSON byte array".into())
        })?;
        Ok(Zeroizing::new(bytes))
    }

    fn lock_vault(&self) -> std::sync::MutexGuard<'_, VaultSession<S>> {
        self.vault.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build an ed25519 signing key from stored key bytes.
///
/// Accepts a 32-byte seed or a 64-byte keypair (seed first), the two
/// encodings found in wallet databases.
fn signing_key(bytes: &[u8]) -> Result<SigningKey> {
    let seed: [u8; 32] = match bytes.len() {
        32 => bytes.try_into().map_err(|_| {
            AgentWalletError::SigningFailed("secret key seed conversion failed".into())
        })?,
        64 => bytes[..32].try_into().map_err(|_| {
            AgentWalletError::SigningFailed("secret key seed conversion failed".into())
        })?,
        n => {
            return Err(AgentWalletError::SigningFailed(format!(
                "secret key must be 32 or 64 bytes, got {n}"
            )))
        }
    };
    Ok(SigningKey::from_bytes(&seed))
}

/// Render the text a sign-in request asks the user's key to attest.
fn sign_in_message(domain: &str, address: &str, statement: Option<&str>) -> String {
    let mut message = format!("{domain} wants you to sign in with your wallet account:\n{address}");
    if let Some(statement) = statement {
        message.push_str("\n\n");
        message.push_str(statement);
    }
    message.push_str("\n\nIssued At: ");
    message.push_str(&Utc::now().to_rfc3339());
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_message_includes_domain_and_address() {
        let message = sign_in_message("example.org", "abc123", None);
        assert!(message.starts_with(
            "example.org wants you to sign in with your wallet account:\nabc123"
        ));
        assert!(message.contains("Issued At: "));
    }

    #[test]
    fn sign_in_message_carries_statement() {
        let message = sign_in_message("example.org", "abc123", Some("Prove wallet ownership"));
        assert!(message.contains("\n\nProve wallet ownership\n\n"));
    }

    #[test]
    fn signing_key_accepts_seed_and_keypair_lengths() {
        let seed = [7u8; 32];
        let from_seed = signing_key(&seed).unwrap();

        let mut keypair = [0u8; 64];
        keypair[..32].copy_from_slice(&seed);
        keypair[32..].copy_from_slice(from_seed.verifying_key().as_bytes());
        let from_pair = signing_key(&keypair).unwrap();

        assert_eq!(from_seed.to_bytes(), from_pair.to_bytes());
    }

    #[test]
    fn signing_key_rejects_odd_lengths() {
        assert!(signing_key(&[1u8; 31]).is_err());
        assert!(signing_key(&[1u8; 65]).is_err());
    }
}
