//! Session orchestration for the Jules agent-session SDK.
//!
//! Provides:
//! - `SessionController` - Initialize, create a session, send messages
//! - `ActivityPoller` - Background task turning new activities into messages
//! - `cursor` - Reconciliation of fetched activities against the last seen one
//! - Credential stores (memory, JSON file)

pub mod controller;
pub mod cursor;
pub mod feeds;
pub mod poller;
pub mod storage;

pub use controller::{SessionController, SessionError};
pub use feeds::Feeds;
pub use poller::{ActivityPoller, PollerExit, PollerHandle, PollerState};
#[cfg(feature = "file-store")]
pub use storage::FileCredentialStore;
pub use storage::MemoryCredentialStore;
