//! Typed resource clients for the Jules session API.
//!
//! Provides:
//! - `JulesClient` - Sources, Sessions, Activities and messages
//! - Wire envelopes and pagination (`protocol`)

pub mod client;
pub mod protocol;

pub use client::{JulesClient, Result};
pub use protocol::{
    ListActivitiesResponse, ListSessionsResponse, ListSourcesResponse, PageRequest,
    SendMessageRequest,
};
