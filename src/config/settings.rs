use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Pbkdf2Params, MIN_ITERATIONS};
use crate::errors::{AgentWalletError, Result};

/// Deployment configuration, loaded from `agentwallet.toml`.
///
/// Every field has a sensible default so the core works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds of inactivity before the vault locks itself (default: 300).
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,

    /// PBKDF2 iteration count for blob keys (default: 600 000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Accept secret-key blobs stored as raw plaintext JSON when
    /// decryption fails.  Migration shim for pre-vault installs;
    /// off by default.
    #[serde(default)]
    pub accept_legacy_plaintext: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_auto_lock_secs() -> u64 {
    300
}

fn default_pbkdf2_iterations() -> u32 {
    MIN_ITERATIONS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_lock_secs: default_auto_lock_secs(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            accept_legacy_plaintext: false,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    const FILE_NAME: &'static str = "agentwallet.toml";

    /// Load settings from `<dir>/agentwallet.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            AgentWalletError::ConfigError(format!(
                "Failed to parse {}: {e}",
                config_path.display()
            ))
        })?;

        if settings.pbkdf2_iterations < MIN_ITERATIONS {
            return Err(AgentWalletError::ConfigError(format!(
                "pbkdf2_iterations must be at least {MIN_ITERATIONS} (got {})",
                settings.pbkdf2_iterations
            )));
        }

        Ok(settings)
    }

    /// The auto-lock window as a `Duration`.
    pub fn auto_lock(&self) -> Duration {
        Duration::from_secs(self.auto_lock_secs)
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn pbkdf2_params(&self) -> Pbkdf2Params {
        Pbkdf2Params {
            iterations: self.pbkdf2_iterations,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
