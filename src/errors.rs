use thiserror::Error;

/// All errors that can occur in the wallet core.
#[derive(Debug, Error)]
pub enum AgentWalletError {
    // --- Crypto errors ---
    //
    // A wrong password and a tampered blob are deliberately reported as
    // the same error so callers cannot build a decryption oracle.
    #[error("Authentication failed — wrong password or corrupted data")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Vault is locked — unlock it first")]
    VaultLocked,

    #[error("Session store error: {0}")]
    SessionStoreError(String),

    // --- Request broker errors ---
    #[error("A request is already pending approval")]
    RequestAlreadyPending,

    #[error("No pending request")]
    NoPendingRequest,

    #[error("Request rejected")]
    RequestRejected,

    // --- Account errors ---
    #[error("No active account")]
    NoActiveAccount,

    // --- Signing errors ---
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for wallet-core results.
pub type Result<T> = std::result::Result<T, AgentWalletError>;
