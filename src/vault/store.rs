//! Ephemeral session storage abstraction.
//!
//! In the deployed extension this is the browser's session storage: it
//! survives background-context eviction but is wiped on a full browser
//! restart.  The core only sees this trait, so tests and the harness
//! binary plug in an in-memory table instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{AgentWalletError, Result};

/// A string key-value store with session lifetime.
///
/// Implementations must be safe to share with the background context
/// that may be torn down and restarted at any point between calls.
pub trait SessionStore: Send {
    /// Read a value, `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write or overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key.  Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// Shared ownership of a store is still a store.  This is what lets a
// restarted `VaultSession` reopen the same backing table.
impl<S: SessionStore + ?Sized + Sync> SessionStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory `SessionStore` used by tests and the harness binary.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AgentWalletError::SessionStoreError("session store poisoned".into()))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
