//! Collaborator traits: transport, connector and credential store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::{ClientError, TransportError};

/// HTTP verbs used by the session API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated JSON request channel to the session API.
///
/// Implementations own credentials, routing and (de)serialization. `path` is
/// relative to the API root and may carry a query string.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request.
    ///
    /// # Errors
    /// `ClientError::Api` when the server answered with a non-success status,
    /// `ClientError::Transport` when no usable answer was received.
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError>;
}

/// Binds a [`Transport`] to a credential.
///
/// Connecting must not perform I/O; it only prepares the handle.
pub trait Connector: Send + Sync {
    /// Build a transport authenticated with `api_key`.
    ///
    /// # Errors
    /// Returns error if the transport cannot be configured.
    fn connect(&self, api_key: &str) -> Result<Arc<dyn Transport>, TransportError>;
}

/// Credential store error.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid credential file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("credential store error: {0}")]
    Internal(String),
}

/// Well-known credential store keys.
pub mod keys {
    /// API key used to authenticate the transport.
    pub const API_KEY: &str = "api_key";
    /// Resource name of the last selected source.
    pub const SELECTED_SOURCE_NAME: &str = "selected_source_name";
}

/// Key-value store for credentials and small settings.
pub trait CredentialStore: Send + Sync {
    /// Value for `key`, or `None` if unset or empty.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    /// Returns error if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError>;
}
