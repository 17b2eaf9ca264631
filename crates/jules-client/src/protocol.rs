//! Wire envelopes for list endpoints and request bodies.

use jules_core::{Activity, Session, Source};
use serde::{Deserialize, Serialize};

/// One page of sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSourcesResponse {
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// One page of sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// One page of activities, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActivitiesResponse {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Body of `:sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub prompt: String,
}

/// Page selection for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

impl PageRequest {
    /// First page with the server's default size.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            page_size: None,
            page_token: None,
        }
    }

    #[must_use]
    pub const fn with_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// Query string for this page, including the leading `?`, or empty.
    #[must_use]
    pub fn query(&self) -> String {
        let mut params = Vec::new();
        if let Some(size) = self.page_size {
            params.push(format!("pageSize={size}"));
        }
        if let Some(token) = self.page_token.as_deref().filter(|t| !t.is_empty()) {
            params.push(format!("pageToken={}", encode_query_value(token)));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_query_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_no_query() {
        assert_eq!(PageRequest::first().query(), "");
    }

    #[test]
    fn page_query_encodes_token() {
        let page = PageRequest::first().with_size(50).with_token("a+b/c=");
        assert_eq!(page.query(), "?pageSize=50&pageToken=a%2Bb%2Fc%3D");
    }

    #[test]
    fn missing_list_field_is_empty() {
        let page: ListActivitiesResponse = serde_json::from_str("{}").unwrap();
        assert!(page.activities.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn list_sources_parses_next_token() {
        let page: ListSourcesResponse = serde_json::from_value(serde_json::json!({
            "sources": [{ "name": "sources/github/acme/widgets", "id": "github/acme/widgets" }],
            "nextPageToken": "p2"
        }))
        .unwrap();
        assert_eq!(page.sources.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
    }
}
