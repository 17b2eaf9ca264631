//! Core abstractions for the Jules agent-session SDK.
//!
//! This crate provides the fundamental building blocks:
//! - `Source`, `Session`, `Activity` - Wire data model
//! - `ChatMessage` / `LogEntry` - Locally rendered feed entries
//! - `MsgStore` - Broadcast + history for presentation layers
//! - `ClientError` / `TransportError` - Outcome taxonomy
//! - `Transport`, `Connector` and `CredentialStore` traits
//! - `SdkConfig` - Endpoint and polling configuration

pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod model;
pub mod msg_store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod traits;

pub use config::SdkConfig;
pub use error::{BoxError, ClientError, TransportError};
pub use message::{ChatMessage, LogEntry, LogLevel, Role};
pub use model::{
    Activity, ActivityId, CreateSessionRequest, GitHubBranch, GitHubRepo, GitHubRepoContext,
    MessageResponse, Session, SessionId, SessionState, Source, SourceContext,
};
pub use msg_store::{FeedItem, FeedView, MsgStore};
pub use traits::{Connector, CredentialError, CredentialStore, HttpMethod, Transport, keys};
