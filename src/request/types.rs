//! Typed vocabulary for approval requests.
//!
//! Each request kind pairs an input shape with an output shape.  The
//! broker treats payloads as opaque — whether a resolution outcome
//! matches the pending payload's kind is the approval surface's
//! contract, not validated here.
//!
//! Byte fields serialize as base64 strings so payloads survive JSON
//! message ports unchanged.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::accounts::WalletAccount;

/// The five sensitive-operation kinds a page context may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    Connect,
    SignMessage,
    SignTransaction,
    SignAndSendTransaction,
    SignIn,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Connect => "connect",
            RequestKind::SignMessage => "signMessage",
            RequestKind::SignTransaction => "signTransaction",
            RequestKind::SignAndSendTransaction => "signAndSendTransaction",
            RequestKind::SignIn => "signIn",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Per-kind inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectInput {
    /// Connect without prompting if already authorized.
    #[serde(default)]
    pub silent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageInput {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub message: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTransactionInput {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub transaction: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignAndSendTransactionInput {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub transaction: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInInput {
    /// Domain requesting the sign-in; defaults to "agent".
    pub domain: Option<String>,
    /// Address to sign in with; defaults to the active account.
    pub address: Option<String>,
    /// Optional human-readable statement shown to the user.
    pub statement: Option<String>,
}

// ---------------------------------------------------------------------------
// Per-kind outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectOutput {
    pub accounts: Vec<WalletAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignMessageOutput {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub signature: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub signed_message: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTransactionOutput {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub signed_transaction: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignAndSendTransactionOutput {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInOutput {
    pub account: WalletAccount,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub signed_message: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub signature: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Tagged payload and outcome
// ---------------------------------------------------------------------------

/// Kind-specific input data, as parked in the broker slot and carried
/// in `onRequestCreate` notifications (`{"type": ..., "data": ...}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum RequestPayload {
    Connect(Option<ConnectInput>),
    SignMessage(Vec<SignMessageInput>),
    SignTransaction(Vec<SignTransactionInput>),
    SignAndSendTransaction(Vec<SignAndSendTransactionInput>),
    SignIn(Vec<SignInInput>),
}

impl RequestPayload {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestPayload::Connect(_) => RequestKind::Connect,
            RequestPayload::SignMessage(_) => RequestKind::SignMessage,
            RequestPayload::SignTransaction(_) => RequestKind::SignTransaction,
            RequestPayload::SignAndSendTransaction(_) => RequestKind::SignAndSendTransaction,
            RequestPayload::SignIn(_) => RequestKind::SignIn,
        }
    }
}

/// Kind-specific result data delivered back to the original caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum RequestOutcome {
    Connect(ConnectOutput),
    SignMessage(Vec<SignMessageOutput>),
    SignTransaction(Vec<SignTransactionOutput>),
    SignAndSendTransaction(Vec<SignAndSendTransactionOutput>),
    SignIn(Vec<SignInOutput>),
}

impl RequestOutcome {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestOutcome::Connect(_) => RequestKind::Connect,
            RequestOutcome::SignMessage(_) => RequestKind::SignMessage,
            RequestOutcome::SignTransaction(_) => RequestKind::SignTransaction,
            RequestOutcome::SignAndSendTransaction(_) => RequestKind::SignAndSendTransaction,
            RequestOutcome::SignIn(_) => RequestKind::SignIn,
        }
    }
}

// ---------------------------------------------------------------------------
// Base64 serde helpers
// ---------------------------------------------------------------------------

/// Serialize a byte vector as a base64 string.
pub(crate) fn base64_encode<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Deserialize a base64 string back into a byte vector.
pub(crate) fn base64_decode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}
