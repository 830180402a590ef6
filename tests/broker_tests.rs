//! Integration tests for the single-flight request broker.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use agentwallet::accounts::{MemoryAccountStore, WalletAccount};
use agentwallet::errors::{AgentWalletError, Result};
use agentwallet::request::types::{
    RequestOutcome, RequestPayload, SignMessageInput, SignMessageOutput,
};
use agentwallet::request::{CreateOutcome, RequestBroker, RequestKind, RequestObserver};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn account_store_with_one_account() -> Arc<MemoryAccountStore> {
    let store = Arc::new(MemoryAccountStore::new());
    store.add_account(WalletAccount {
        address: "00ff".into(),
        public_key: vec![0x00, 0xff],
        label: None,
    });
    store
}

fn sign_message_payload(message: &[u8]) -> RequestPayload {
    RequestPayload::SignMessage(vec![SignMessageInput {
        message: message.to_vec(),
    }])
}

fn sign_message_outcome(signature: &[u8], message: &[u8]) -> RequestOutcome {
    RequestOutcome::SignMessage(vec![SignMessageOutput {
        signature: signature.to_vec(),
        signed_message: message.to_vec(),
    }])
}

/// Observer that records every delivery into a shared log.
struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl RequestObserver for RecordingObserver {
    fn on_request_create(&self, kind: RequestKind, _payload: &RequestPayload) -> Result<()> {
        self.events.lock().unwrap().push(format!("create:{kind}"));
        Ok(())
    }

    fn on_request_reset(&self) -> Result<()> {
        self.events.lock().unwrap().push("reset".into());
        Ok(())
    }
}

/// Observer whose deliveries always fail.
struct FailingObserver;

impl RequestObserver for FailingObserver {
    fn on_request_create(&self, _kind: RequestKind, _payload: &RequestPayload) -> Result<()> {
        Err(AgentWalletError::CommandFailed("observer down".into()))
    }

    fn on_request_reset(&self) -> Result<()> {
        Err(AgentWalletError::CommandFailed("observer down".into()))
    }
}

// ---------------------------------------------------------------------------
// Single-flight occupancy
// ---------------------------------------------------------------------------

#[test]
fn second_create_fails_while_occupied() {
    let broker = RequestBroker::new(account_store_with_one_account());

    let first = broker.create(sign_message_payload(b"one")).unwrap();
    assert!(matches!(first, CreateOutcome::Pending(_)));

    let second = broker.create(sign_message_payload(b"two"));
    assert!(matches!(
        second.unwrap_err(),
        AgentWalletError::RequestAlreadyPending
    ));

    // Connect is also refused while the slot is occupied.
    let connect = broker.create(RequestPayload::Connect(None));
    assert!(matches!(
        connect.unwrap_err(),
        AgentWalletError::RequestAlreadyPending
    ));
}

#[test]
fn slot_is_reusable_after_each_settlement_path() {
    let broker = RequestBroker::new(account_store_with_one_account());

    let _first = broker.create(sign_message_payload(b"a")).unwrap();
    broker.resolve(sign_message_outcome(&[1], b"a")).unwrap();

    let _second = broker.create(sign_message_payload(b"b")).unwrap();
    broker.reject().unwrap();

    assert!(broker.get().is_none());
    assert!(broker.create(sign_message_payload(b"c")).is_ok());
}

// ---------------------------------------------------------------------------
// Settlement delivery
// ---------------------------------------------------------------------------

#[test]
fn resolve_delivers_the_outcome_to_the_creator() {
    let broker = RequestBroker::new(account_store_with_one_account());

    let CreateOutcome::Pending(ticket) = broker.create(sign_message_payload(b"payload")).unwrap()
    else {
        panic!("sign-message must park in the slot");
    };
    assert!(ticket.try_wait().is_none(), "not settled yet");

    broker
        .resolve(sign_message_outcome(&[9, 9, 9], b"payload"))
        .unwrap();

    match ticket.wait().unwrap() {
        RequestOutcome::SignMessage(outputs) => {
            assert_eq!(outputs.len(), 1);
            assert_eq!(outputs[0].signature, vec![9, 9, 9]);
        }
        other => panic!("unexpected outcome kind: {}", other.kind()),
    }
    assert!(broker.get().is_none());
}

#[test]
fn reject_delivers_a_rejection_to_the_creator() {
    let broker = RequestBroker::new(account_store_with_one_account());

    let CreateOutcome::Pending(ticket) = broker.create(sign_message_payload(b"nope")).unwrap()
    else {
        panic!("sign-message must park in the slot");
    };

    broker.reject().unwrap();

    assert!(matches!(
        ticket.wait().unwrap_err(),
        AgentWalletError::RequestRejected
    ));
    assert!(broker.get().is_none());
}

#[test]
fn wait_timeout_elapses_while_the_request_is_pending() {
    let broker = RequestBroker::new(account_store_with_one_account());

    let CreateOutcome::Pending(ticket) = broker.create(sign_message_payload(b"slow")).unwrap()
    else {
        panic!("sign-message must park in the slot");
    };

    assert!(ticket.wait_timeout(Duration::from_millis(50)).is_none());

    broker.reject().unwrap();
    assert!(matches!(
        ticket.wait_timeout(Duration::from_secs(5)),
        Some(Err(AgentWalletError::RequestRejected))
    ));
}

#[test]
fn settling_an_empty_slot_fails() {
    let broker = RequestBroker::new(account_store_with_one_account());

    assert!(matches!(
        broker.resolve(sign_message_outcome(&[], b"")).unwrap_err(),
        AgentWalletError::NoPendingRequest
    ));
    assert!(matches!(
        broker.reject().unwrap_err(),
        AgentWalletError::NoPendingRequest
    ));

    // A reject that lost the race to a resolve sees the same error.
    let _ticket = broker.create(sign_message_payload(b"raced")).unwrap();
    broker.resolve(sign_message_outcome(&[1], b"raced")).unwrap();
    assert!(matches!(
        broker.reject().unwrap_err(),
        AgentWalletError::NoPendingRequest
    ));
}

#[test]
fn dropping_the_broker_rejects_outstanding_tickets() {
    let broker = RequestBroker::new(account_store_with_one_account());

    let CreateOutcome::Pending(ticket) = broker.create(sign_message_payload(b"orphan")).unwrap()
    else {
        panic!("sign-message must park in the slot");
    };

    drop(broker);
    assert!(matches!(
        ticket.wait().unwrap_err(),
        AgentWalletError::RequestRejected
    ));
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[test]
fn get_exposes_kind_and_payload_of_the_pending_request() {
    let broker = RequestBroker::new(account_store_with_one_account());
    assert!(broker.get().is_none());

    let _ticket = broker.create(sign_message_payload(b"inspect me")).unwrap();

    let snapshot = broker.get().expect("slot occupied");
    assert_eq!(snapshot.kind, RequestKind::SignMessage);
    match snapshot.payload {
        RequestPayload::SignMessage(inputs) => {
            assert_eq!(inputs[0].message, b"inspect me".to_vec());
        }
        other => panic!("unexpected payload kind: {}", other.kind()),
    }
}

// ---------------------------------------------------------------------------
// Connect auto-approval
// ---------------------------------------------------------------------------

#[test]
fn connect_is_answered_synchronously_without_the_slot() {
    let broker = RequestBroker::new(account_store_with_one_account());
    let events = Arc::new(Mutex::new(Vec::new()));
    broker.register_observer(Box::new(RecordingObserver {
        events: Arc::clone(&events),
    }));

    let outcome = broker.create(RequestPayload::Connect(None)).unwrap();
    let CreateOutcome::Connected(output) = outcome else {
        panic!("connect must settle at create time");
    };
    assert_eq!(output.accounts.len(), 1);
    assert_eq!(output.accounts[0].address, "00ff");

    // No slot occupied, no broadcast.
    assert!(broker.get().is_none());
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn connect_with_an_empty_wallet_returns_no_accounts() {
    let broker = RequestBroker::new(Arc::new(MemoryAccountStore::new()));

    let CreateOutcome::Connected(output) =
        broker.create(RequestPayload::Connect(None)).unwrap()
    else {
        panic!("connect must settle at create time");
    };
    assert!(output.accounts.is_empty());
}

// ---------------------------------------------------------------------------
// Observer broadcast
// ---------------------------------------------------------------------------

#[test]
fn lifecycle_events_reach_every_observer() {
    let broker = RequestBroker::new(account_store_with_one_account());
    let events_a = Arc::new(Mutex::new(Vec::new()));
    let events_b = Arc::new(Mutex::new(Vec::new()));
    broker.register_observer(Box::new(RecordingObserver {
        events: Arc::clone(&events_a),
    }));
    broker.register_observer(Box::new(RecordingObserver {
        events: Arc::clone(&events_b),
    }));

    let _ticket = broker.create(sign_message_payload(b"observed")).unwrap();
    broker
        .resolve(sign_message_outcome(&[7], b"observed"))
        .unwrap();

    let expected = vec!["create:signMessage".to_string(), "reset".to_string()];
    assert_eq!(*events_a.lock().unwrap(), expected);
    assert_eq!(*events_b.lock().unwrap(), expected);
}

#[test]
fn a_failing_observer_is_skipped_not_fatal() {
    let broker = RequestBroker::new(account_store_with_one_account());
    let events = Arc::new(Mutex::new(Vec::new()));
    // Failing observer registered first: its errors must not stop
    // delivery to the next one, nor fail the broker calls.
    broker.register_observer(Box::new(FailingObserver));
    broker.register_observer(Box::new(RecordingObserver {
        events: Arc::clone(&events),
    }));

    let _ticket = broker.create(sign_message_payload(b"x")).unwrap();
    broker.reject().unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["create:signMessage".to_string(), "reset".to_string()]
    );
}

// ---------------------------------------------------------------------------
// Cross-thread settlement
// ---------------------------------------------------------------------------

#[test]
fn a_waiting_creator_thread_receives_the_settlement() {
    let broker = Arc::new(RequestBroker::new(account_store_with_one_account()));

    let page_broker = Arc::clone(&broker);
    let waiter = thread::spawn(move || -> Result<RequestOutcome> {
        match page_broker.create(sign_message_payload(b"threaded"))? {
            CreateOutcome::Pending(ticket) => ticket.wait(),
            CreateOutcome::Connected(_) => panic!("sign-message settled as connect"),
        }
    });

    // Approval surface: poll until the request lands, then approve.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while broker.get().is_none() {
        assert!(std::time::Instant::now() < deadline, "request never arrived");
        thread::sleep(Duration::from_millis(5));
    }
    broker
        .resolve(sign_message_outcome(&[4, 2], b"threaded"))
        .unwrap();

    match waiter.join().unwrap().unwrap() {
        RequestOutcome::SignMessage(outputs) => assert_eq!(outputs[0].signature, vec![4, 2]),
        other => panic!("unexpected outcome kind: {}", other.kind()),
    }
}
