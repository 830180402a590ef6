//! The vault session: password-gated access to blob encryption.
//!
//! A `VaultSession` is either `Locked` (no password held) or
//! `Unlocked` (password in memory plus a copy in the session store so
//! a restarted background context can resume the session).  Every
//! successful unlock/encrypt/decrypt pushes the auto-lock deadline
//! forward; once the deadline passes, the session locks itself.
//!
//! There is no OS timer.  The deadline is a plain timestamp recomputed
//! on every operation, so "the last reset wins" and "no two timers
//! exist" hold by construction.  Expiry side effects (clearing memory
//! and the store entry) run on the first operation at or after the
//! deadline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::{codec, Pbkdf2Params};
use crate::errors::{AgentWalletError, Result};

use super::store::SessionStore;

/// Session-store key holding the unlock record while unlocked.
pub const SESSION_KEY: &str = "vault-session";

/// Default inactivity window before the vault locks itself.
pub const DEFAULT_AUTO_LOCK: Duration = Duration::from_secs(5 * 60);

/// What gets persisted to the session store while unlocked.
///
/// Storing the plaintext password here is a deliberate, documented
/// trade: it is the only way a service-worker-style background context
/// can resume an unlocked session after eviction.  The deadline rides
/// along so a restart cannot resurrect an already-expired session.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    password: String,
    deadline: DateTime<Utc>,
}

/// Password-gated encryption session with sliding auto-lock.
pub struct VaultSession<S: SessionStore> {
    store: S,
    password: Option<Zeroizing<String>>,
    lock_deadline: Option<DateTime<Utc>>,
    auto_lock: chrono::Duration,
    kdf: Pbkdf2Params,
}

impl<S: SessionStore> VaultSession<S> {
    /// Create a locked session with default settings.
    pub fn new(store: S) -> Self {
        Self {
            store,
            password: None,
            lock_deadline: None,
            auto_lock: to_chrono(DEFAULT_AUTO_LOCK),
            kdf: Pbkdf2Params::default(),
        }
    }

    /// Create a locked session configured from `Settings`.
    pub fn from_settings(store: S, settings: &Settings) -> Self {
        Self {
            store,
            password: None,
            lock_deadline: None,
            auto_lock: to_chrono(settings.auto_lock()),
            kdf: settings.pbkdf2_params(),
        }
    }

    /// Override the auto-lock window (builder style, mainly for tests).
    pub fn with_auto_lock(mut self, window: Duration) -> Self {
        self.auto_lock = to_chrono(window);
        self
    }

    /// Attempt to recover an unlocked session from the session store.
    ///
    /// Called once on process start.  If the store holds a record whose
    /// deadline has not passed, the session re-enters `Unlocked` and the
    /// window is re-armed; otherwise the stale entry is discarded and
    /// the session stays `Locked`.
    pub fn init(&mut self) -> Result<()> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(());
        };

        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(_) => {
                // Unreadable entry — treat as locked rather than erroring.
                self.store.remove(SESSION_KEY)?;
                return Ok(());
            }
        };

        if record.deadline <= Utc::now() {
            tracing::debug!("stored vault session already expired, discarding");
            self.store.remove(SESSION_KEY)?;
            return Ok(());
        }

        self.password = Some(Zeroizing::new(record.password));
        self.reset_lock_timer()?;
        tracing::info!("vault session recovered from session store");
        Ok(())
    }

    /// Unlock the vault with `password` and arm the auto-lock window.
    ///
    /// No password verification happens here — a wrong password simply
    /// fails the first `decrypt` with `AuthenticationFailed`.  Calling
    /// `unlock` while already unlocked replaces the held password.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        self.password = Some(Zeroizing::new(password.to_string()));
        self.reset_lock_timer()?;
        tracing::info!("vault unlocked");
        Ok(())
    }

    /// Lock the vault: clear the in-memory password, the deadline, and
    /// the session store entry.
    pub fn lock(&mut self) -> Result<()> {
        self.password = None;
        self.lock_deadline = None;
        self.store.remove(SESSION_KEY)?;
        tracing::info!("vault locked");
        Ok(())
    }

    /// Whether the vault is locked.  Pure read, no side effects: a
    /// session past its deadline reports locked here even though the
    /// store entry is cleared lazily by the next operation.
    pub fn is_locked(&self) -> bool {
        match (&self.password, self.lock_deadline) {
            (Some(_), Some(deadline)) => deadline <= Utc::now(),
            _ => true,
        }
    }

    /// Encrypt `plaintext` with the held password and re-arm the window.
    ///
    /// Fails with `VaultLocked` when locked.
    pub fn encrypt(&mut self, plaintext: &str) -> Result<String> {
        self.expire_if_due()?;
        let password = self.password.as_ref().ok_or(AgentWalletError::VaultLocked)?;
        let blob = codec::encrypt(plaintext, password, &self.kdf)?;
        self.reset_lock_timer()?;
        Ok(blob)
    }

    /// Decrypt a blob with the held password and re-arm the window.
    ///
    /// Fails with `VaultLocked` when locked, `AuthenticationFailed`
    /// when the password is wrong or the blob is damaged.
    pub fn decrypt(&mut self, blob: &str) -> Result<String> {
        self.expire_if_due()?;
        let password = self.password.as_ref().ok_or(AgentWalletError::VaultLocked)?;
        let plaintext = codec::decrypt(blob, password, &self.kdf)?;
        self.reset_lock_timer()?;
        Ok(plaintext)
    }

    /// Push the deadline to `now + window` and persist the record.
    ///
    /// The password and the deadline are set together — one is never
    /// present without the other.  A record that cannot be persisted
    /// leaves the session locked rather than half-armed.
    fn reset_lock_timer(&mut self) -> Result<()> {
        match self.persist_record() {
            Ok(deadline) => {
                self.lock_deadline = Some(deadline);
                Ok(())
            }
            Err(e) => {
                self.password = None;
                self.lock_deadline = None;
                Err(e)
            }
        }
    }

    fn persist_record(&mut self) -> Result<DateTime<Utc>> {
        let password = self.password.as_ref().ok_or(AgentWalletError::VaultLocked)?;
        let deadline = Utc::now() + self.auto_lock;

        let record = SessionRecord {
            password: password.to_string(),
            deadline,
        };
        let raw = serde_json::to_string(&record)
            .map_err(|e| AgentWalletError::SerializationError(e.to_string()))?;
        self.store.set(SESSION_KEY, &raw)?;
        Ok(deadline)
    }

    /// Run the auto-lock transition if the window has elapsed.
    fn expire_if_due(&mut self) -> Result<()> {
        if let Some(deadline) = self.lock_deadline {
            if deadline <= Utc::now() {
                tracing::info!("auto-lock window elapsed");
                self.lock()?;
            }
        }
        Ok(())
    }
}

fn to_chrono(window: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(window.as_millis() as i64)
}
