//! Outcome taxonomy shared by the transport and resource clients.

use thiserror::Error;

/// Boxed underlying cause of a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The request could not be completed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or body-read failure.
    #[error("request failed: {0}")]
    Request(#[source] BoxError),
    /// The server answered with a body that is not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// The transport could not be built from the supplied settings.
    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl TransportError {
    /// Wrap any error as a request failure.
    pub fn request(err: impl Into<BoxError>) -> Self {
        Self::Request(err.into())
    }
}

/// Failure outcome of a resource operation.
///
/// Success is the `Ok` arm of the surrounding `Result`; the two failure arms
/// mirror "the server rejected the request" and "the request never completed".
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Rejected locally before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// HTTP status of an API rejection, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidArgument(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_carries_status_and_body() {
        let err = ClientError::Api {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "api error (500): boom");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn transport_error_is_transparent() {
        let err = ClientError::from(TransportError::request("connection refused"));
        assert_eq!(err.to_string(), "request failed: connection refused");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn decode_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ClientError = TransportError::from(json_err).into();
        assert!(matches!(err, ClientError::Transport(TransportError::Decode(_))));
    }
}
