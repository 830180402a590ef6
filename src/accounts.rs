//! Wallet account collaborator interface.
//!
//! Account records and encrypted key material live in the extension's
//! database layer, outside this crate.  The core consumes them through
//! `AccountSource`; tests and the harness binary use the in-memory
//! implementation.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::errors::{AgentWalletError, Result};
use crate::request::types::{base64_decode, base64_encode};

/// A wallet account as presented to connecting surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    /// Display address (hex of the ed25519 public key).
    pub address: String,

    /// Raw public key bytes (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub public_key: Vec<u8>,

    /// Optional user-facing label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Read access to the wallet's accounts and the active account's
/// encrypted secret-key blob.
pub trait AccountSource: Send + Sync {
    /// All accounts in the wallet, for connect responses.
    fn wallet_accounts(&self) -> Result<Vec<WalletAccount>>;

    /// The currently active account.
    fn active_account(&self) -> Result<WalletAccount>;

    /// The active account's secret key as a vault-encrypted blob.
    fn active_account_secret(&self) -> Result<String>;
}

impl<A: AccountSource + ?Sized> AccountSource for Arc<A> {
    fn wallet_accounts(&self) -> Result<Vec<WalletAccount>> {
        (**self).wallet_accounts()
    }

    fn active_account(&self) -> Result<WalletAccount> {
        (**self).active_account()
    }

    fn active_account_secret(&self) -> Result<String> {
        (**self).active_account_secret()
    }
}

/// In-memory `AccountSource` used by tests and the harness binary.
///
/// Holds at most one account slot marked active; the encrypted secret
/// is set separately, mirroring the extension database where the blob
/// column is written after vault setup.
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<WalletAccount>,
    active: Option<usize>,
    active_secret: Option<String>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account.  The first account added becomes active.
    pub fn add_account(&self, account: WalletAccount) {
        let mut inner = self.lock();
        inner.accounts.push(account);
        if inner.active.is_none() {
            inner.active = Some(inner.accounts.len() - 1);
        }
    }

    /// Store the active account's encrypted secret-key blob.
    pub fn set_active_secret(&self, blob: String) {
        self.lock().active_secret = Some(blob);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AccountSource for MemoryAccountStore {
    fn wallet_accounts(&self) -> Result<Vec<WalletAccount>> {
        Ok(self.lock().accounts.clone())
    }

    fn active_account(&self) -> Result<WalletAccount> {
        let inner = self.lock();
        inner
            .active
            .and_then(|i| inner.accounts.get(i).cloned())
            .ok_or(AgentWalletError::NoActiveAccount)
    }

    fn active_account_secret(&self) -> Result<String> {
        self.lock()
            .active_secret
            .clone()
            .ok_or(AgentWalletError::NoActiveAccount)
    }
}
