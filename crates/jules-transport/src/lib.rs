//! HTTP transport for the Jules session API.
//!
//! Provides:
//! - `HttpTransport` - `reqwest`-backed [`jules_core::Transport`]
//! - `HttpConnector` - binds an `HttpTransport` to an API key

pub mod http;

pub use http::{API_KEY_HEADER, HttpConnector, HttpTransport};
