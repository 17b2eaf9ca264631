//! `reqwest` implementation of the transport collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use jules_core::{ClientError, Connector, HttpMethod, SdkConfig, Transport, TransportError};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue},
};
use serde_json::Value;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Authenticated HTTP client for the session API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: Client,
}

impl HttpTransport {
    /// Create a transport for `config.base_url` authenticated with `api_key`.
    ///
    /// # Errors
    /// Returns `TransportError::Config` if the key is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(config: &SdkConfig, api_key: &str) -> Result<Self, TransportError> {
        let mut key = HeaderValue::from_str(api_key.trim())
            .map_err(|e| TransportError::Config(format!("invalid api key: {e}")))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .user_agent(concat!("jules-sdk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// API root this transport sends requests to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "sending request");

        let builder = match method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
        };
        let builder = match body {
            Some(body) => builder.json(&body),
            None => builder,
        };

        let response = builder.send().await.map_err(TransportError::request)?;
        let status = response.status();
        let text = response.text().await.map_err(TransportError::request)?;

        if !status.is_success() {
            tracing::warn!(%method, %url, status = status.as_u16(), "request rejected");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_str(&text).map_err(TransportError::from)?)
    }
}

/// Builds [`HttpTransport`]s from a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: SdkConfig,
}

impl HttpConnector {
    #[must_use]
    pub const fn new(config: SdkConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn Transport>, TransportError> {
        Ok(Arc::new(HttpTransport::new(&self.config, api_key)?))
    }
}
