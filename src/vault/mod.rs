//! The vault: session state machine and session storage abstraction.

pub mod session;
pub mod store;

pub use session::{VaultSession, DEFAULT_AUTO_LOCK, SESSION_KEY};
pub use store::{MemorySessionStore, SessionStore};
