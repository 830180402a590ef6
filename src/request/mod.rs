//! The request broker and its typed request vocabulary.

pub mod broker;
pub mod types;

pub use broker::{
    CreateOutcome, PendingRequestSnapshot, PendingTicket, RequestBroker, RequestObserver,
};
pub use types::{RequestKind, RequestOutcome, RequestPayload};
