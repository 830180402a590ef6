//! Glue between the broker and the signing service.
//!
//! This is what an approval surface calls once the user clicks
//! approve: fetch the pending request, run the matching signing
//! operation, and settle the slot with the result.

use crate::accounts::AccountSource;
use crate::errors::{AgentWalletError, Result};
use crate::request::types::{RequestOutcome, RequestPayload};
use crate::request::RequestBroker;
use crate::signing::SignService;
use crate::vault::{SessionStore, VaultSession};

/// Approve the pending request: dispatch by kind to the signing
/// service and resolve the broker with the outcome.
///
/// Fails with `NoPendingRequest` when the slot is empty.  A signing
/// failure propagates without settling the slot, so the surface can
/// still reject or retry.
pub fn approve_pending<S, A, B>(
    broker: &RequestBroker<B>,
    signer: &SignService<S, A>,
) -> Result<()>
where
    S: SessionStore,
    A: AccountSource,
    B: AccountSource,
{
    let snapshot = broker.get().ok_or(AgentWalletError::NoPendingRequest)?;

    let outcome = match snapshot.payload {
        // Connect requests settle at create time and never occupy the
        // slot, but answer one anyway if it somehow got here.
        RequestPayload::Connect(_) => RequestOutcome::Connect(signer.connect()?),
        RequestPayload::SignMessage(inputs) => {
            RequestOutcome::SignMessage(signer.sign_message(&inputs)?)
        }
        RequestPayload::SignTransaction(inputs) => {
            RequestOutcome::SignTransaction(signer.sign_transaction(&inputs)?)
        }
        RequestPayload::SignAndSendTransaction(inputs) => {
            RequestOutcome::SignAndSendTransaction(signer.sign_and_send_transaction(&inputs)?)
        }
        RequestPayload::SignIn(inputs) => RequestOutcome::SignIn(signer.sign_in(&inputs)?),
    };

    broker.resolve(outcome)
}

/// Status summary surfaces poll to decide what to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletStatus {
    pub locked: bool,
    pub has_account: bool,
}

/// Report whether the vault is locked and whether an active account
/// exists.
pub fn wallet_status<S, A>(vault: &VaultSession<S>, accounts: &A) -> WalletStatus
where
    S: SessionStore,
    A: AccountSource,
{
    WalletStatus {
        locked: vault.is_locked(),
        has_account: accounts.active_account().is_ok(),
    }
}
