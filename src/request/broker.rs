//! Single-flight negotiation of sensitive-operation approvals.
//!
//! The broker owns one slot.  An untrusted caller parks a request in
//! it with `create` and blocks on the returned ticket; a trusted
//! approval surface later peeks at the slot with `get` and settles it
//! with `resolve` or `reject`.  Settlement is an explicit one-shot
//! channel stored alongside the request, so no surface ever holds the
//! in-flight operation's completion callbacks directly.
//!
//! Observers are notified when a request is parked and when the slot
//! empties.  Delivery is fire-and-forget: a failing observer is logged
//! and skipped, never retried, and never fails the broker call.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::accounts::AccountSource;
use crate::errors::{AgentWalletError, Result};

use super::types::{ConnectOutput, RequestKind, RequestOutcome, RequestPayload};

/// A surface that wants to hear about request lifecycle events.
///
/// Errors are swallowed per-observer; returning one produces nothing
/// but a debug log line.  Delivery runs on the broker caller's thread,
/// so implementations must hand long work off rather than block.
pub trait RequestObserver: Send + Sync {
    /// A request was parked in the slot and awaits approval.
    fn on_request_create(&self, kind: RequestKind, payload: &RequestPayload) -> Result<()>;

    /// The slot emptied (either settlement path).
    fn on_request_reset(&self) -> Result<()>;
}

/// What `create` hands back.
#[derive(Debug)]
pub enum CreateOutcome {
    /// Connect requests settle at create time, no user interaction.
    Connected(ConnectOutput),
    /// The request was parked; wait on the ticket for settlement.
    Pending(PendingTicket),
}

/// The caller's half of a settlement: a one-shot receiver.
#[derive(Debug)]
pub struct PendingTicket {
    rx: Receiver<SettlementMessage>,
}

type SettlementMessage = std::result::Result<RequestOutcome, AgentWalletError>;

impl PendingTicket {
    /// Block until the request is resolved or rejected.
    ///
    /// A broker dropped without settling surfaces as `RequestRejected`.
    pub fn wait(self) -> Result<RequestOutcome> {
        match self.rx.recv() {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AgentWalletError::RequestRejected),
        }
    }

    /// Block for at most `timeout`; `None` if the request is still
    /// pending when it elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<RequestOutcome>> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(outcome)) => Some(Ok(outcome)),
            Ok(Err(e)) => Some(Err(e)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(AgentWalletError::RequestRejected)),
        }
    }

    /// Non-blocking poll; `None` while the request is still pending.
    pub fn try_wait(&self) -> Option<Result<RequestOutcome>> {
        match self.rx.try_recv() {
            Ok(Ok(outcome)) => Some(Ok(outcome)),
            Ok(Err(e)) => Some(Err(e)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AgentWalletError::RequestRejected)),
        }
    }
}

/// Read-only view of the occupied slot for approval surfaces.
#[derive(Debug, Clone)]
pub struct PendingRequestSnapshot {
    pub kind: RequestKind,
    pub payload: RequestPayload,
    pub created_at: DateTime<Utc>,
}

/// The parked request: payload plus the broker's half of the
/// settlement channel.  Settling consumes it, so exactly one of
/// resolve/reject ever fires for a given request.
struct PendingRequest {
    payload: RequestPayload,
    settle: SyncSender<SettlementMessage>,
    created_at: DateTime<Utc>,
}

/// Single-slot request broker.
pub struct RequestBroker<A: AccountSource> {
    accounts: A,
    slot: Mutex<Option<PendingRequest>>,
    observers: Mutex<Vec<Box<dyn RequestObserver>>>,
}

impl<A: AccountSource> RequestBroker<A> {
    pub fn new(accounts: A) -> Self {
        Self {
            accounts,
            slot: Mutex::new(None),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer surface for lifecycle broadcasts.
    pub fn register_observer(&self, observer: Box<dyn RequestObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Park a request for approval, or auto-approve a connect.
    ///
    /// Fails with `RequestAlreadyPending` while the slot is occupied —
    /// the second caller is not queued and must wait for the reset.
    ///
    /// Connect requests never touch the slot: the agent already
    /// controls the wallet, so connection is answered synchronously
    /// from the account source with no broadcast.
    pub fn create(&self, payload: RequestPayload) -> Result<CreateOutcome> {
        if let RequestPayload::Connect(_) = payload {
            if self.lock_slot().is_some() {
                return Err(AgentWalletError::RequestAlreadyPending);
            }
            let accounts = self.accounts.wallet_accounts()?;
            tracing::debug!(count = accounts.len(), "connect auto-approved");
            return Ok(CreateOutcome::Connected(ConnectOutput { accounts }));
        }

        // Occupancy check and insertion under one guard: two racing
        // creates cannot both observe an empty slot.
        let mut slot = self.lock_slot();
        if slot.is_some() {
            return Err(AgentWalletError::RequestAlreadyPending);
        }

        let (tx, rx) = mpsc::sync_channel(1);
        let kind = payload.kind();
        let notify_payload = payload.clone();
        *slot = Some(PendingRequest {
            payload,
            settle: tx,
            created_at: Utc::now(),
        });
        drop(slot);

        tracing::info!(%kind, "approval request created");
        self.notify(|observer| observer.on_request_create(kind, &notify_payload));

        Ok(CreateOutcome::Pending(PendingTicket { rx }))
    }

    /// Peek at the occupied slot, `None` when empty.
    pub fn get(&self) -> Option<PendingRequestSnapshot> {
        self.lock_slot().as_ref().map(|pending| PendingRequestSnapshot {
            kind: pending.payload.kind(),
            payload: pending.payload.clone(),
            created_at: pending.created_at,
        })
    }

    /// Fulfill the pending request with `outcome` and empty the slot.
    ///
    /// The outcome's shape must match the pending request's kind; the
    /// broker does not check it.  Fails with `NoPendingRequest` when
    /// the slot is empty — including when a concurrent `reject`
    /// already settled it.
    pub fn resolve(&self, outcome: RequestOutcome) -> Result<()> {
        let pending = self
            .lock_slot()
            .take()
            .ok_or(AgentWalletError::NoPendingRequest)?;

        tracing::info!(kind = %pending.payload.kind(), "approval request resolved");
        if pending.settle.send(Ok(outcome)).is_err() {
            tracing::debug!("settlement receiver dropped before resolve");
        }

        self.reset();
        Ok(())
    }

    /// Fail the pending request with `RequestRejected` and empty the
    /// slot.  This is also the designed cancellation path.
    pub fn reject(&self) -> Result<()> {
        let pending = self
            .lock_slot()
            .take()
            .ok_or(AgentWalletError::NoPendingRequest)?;

        tracing::info!(kind = %pending.payload.kind(), "approval request rejected");
        if pending
            .settle
            .send(Err(AgentWalletError::RequestRejected))
            .is_err()
        {
            tracing::debug!("settlement receiver dropped before reject");
        }

        self.reset();
        Ok(())
    }

    /// Shared tail of both settlement paths.
    fn reset(&self) {
        self.notify(|observer| observer.on_request_reset());
    }

    fn notify(&self, deliver: impl Fn(&dyn RequestObserver) -> Result<()>) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            if let Err(e) = deliver(observer.as_ref()) {
                tracing::debug!(error = %e, "observer delivery failed");
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<PendingRequest>> {
        // A poisoned slot mutex still holds consistent data.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
