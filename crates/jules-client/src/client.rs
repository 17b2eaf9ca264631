//! Resource operations over a [`Transport`].

use std::sync::Arc;

use jules_core::{
    Activity, ClientError, CreateSessionRequest, HttpMethod, MessageResponse, Session,
    Source, Transport, TransportError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::{
    ListActivitiesResponse, ListSessionsResponse, ListSourcesResponse, PageRequest,
    SendMessageRequest,
};

/// Result type for resource operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Typed client for the session API.
///
/// Stateless apart from the transport handle; cheap to clone.
#[derive(Clone)]
pub struct JulesClient {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for JulesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JulesClient").finish_non_exhaustive()
    }
}

impl JulesClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    // ----------------------------------------------------------------------------
    // Sources
    // ----------------------------------------------------------------------------

    /// List one page of sources.
    pub async fn list_sources(&self, page: &PageRequest) -> Result<ListSourcesResponse> {
        self.get(&format!("/sources{}", page.query())).await
    }

    /// List every source, following pagination.
    pub async fn list_all_sources(&self) -> Result<Vec<Source>> {
        let mut sources = Vec::new();
        let mut page = PageRequest::first();
        loop {
            let resp = self.list_sources(&page).await?;
            sources.extend(resp.sources);
            match next_page(page.page_token.as_deref(), resp.next_page_token) {
                Some(token) => page = page.with_token(token),
                None => return Ok(sources),
            }
        }
    }

    pub async fn get_source(&self, source_id: &str) -> Result<Source> {
        let id = resource_id(source_id, "sources/", "source")?;
        self.get(&format!("/sources/{id}")).await
    }

    // ----------------------------------------------------------------------------
    // Sessions
    // ----------------------------------------------------------------------------

    pub async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session> {
        if request.source_context.source.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "source context names no source".to_string(),
            ));
        }
        let body = serde_json::to_value(request).map_err(TransportError::from)?;
        self.post("/sessions", body).await
    }

    /// List one page of sessions.
    pub async fn list_sessions(&self, page: &PageRequest) -> Result<ListSessionsResponse> {
        self.get(&format!("/sessions{}", page.query())).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        let id = resource_id(session_id, "sessions/", "session")?;
        self.get(&format!("/sessions/{id}")).await
    }

    /// Approve the plan the agent proposed for a session.
    pub async fn approve_plan(&self, session_id: &str) -> Result<()> {
        let id = resource_id(session_id, "sessions/", "session")?;
        self.transport
            .request(
                HttpMethod::Post,
                &format!("/sessions/{id}:approvePlan"),
                Some(Value::Object(serde_json::Map::new())),
            )
            .await?;
        Ok(())
    }

    // ----------------------------------------------------------------------------
    // Activities
    // ----------------------------------------------------------------------------

    /// List one page of a session's activities.
    pub async fn list_activities(
        &self,
        session_id: &str,
        page: &PageRequest,
    ) -> Result<ListActivitiesResponse> {
        let id = resource_id(session_id, "sessions/", "session")?;
        self.get(&format!("/sessions/{id}/activities{}", page.query()))
            .await
    }

    /// Every activity of a session, in server order.
    pub async fn list_all_activities(&self, session_id: &str) -> Result<Vec<Activity>> {
        let mut activities = Vec::new();
        let mut page = PageRequest::first();
        loop {
            let resp = self.list_activities(session_id, &page).await?;
            activities.extend(resp.activities);
            match next_page(page.page_token.as_deref(), resp.next_page_token) {
                Some(token) => page = page.with_token(token),
                None => return Ok(activities),
            }
        }
    }

    pub async fn get_activity(&self, session_id: &str, activity_id: &str) -> Result<Activity> {
        let sid = resource_id(session_id, "sessions/", "session")?;
        let aid = resource_id(activity_id, "activities/", "activity")?;
        self.get(&format!("/sessions/{sid}/activities/{aid}")).await
    }

    // ----------------------------------------------------------------------------
    // Messages
    // ----------------------------------------------------------------------------

    /// Send a user message into a session.
    ///
    /// The agent's reply is not part of the response; it arrives later as
    /// activities.
    pub async fn send_message(&self, session_id: &str, prompt: &str) -> Result<MessageResponse> {
        let id = resource_id(session_id, "sessions/", "session")?;
        let body = serde_json::to_value(SendMessageRequest {
            prompt: prompt.to_string(),
        })
        .map_err(TransportError::from)?;
        self.post(&format!("/sessions/{id}:sendMessage"), body)
            .await
    }

    // ----------------------------------------------------------------------------
    // Helpers
    // ----------------------------------------------------------------------------

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.transport.request(HttpMethod::Get, path, None).await?;
        decode(value)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let value = self
            .transport
            .request(HttpMethod::Post, path, Some(body))
            .await?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value).map_err(TransportError::from)?)
}

/// Validate an identifier, accepting a full resource name too.
fn resource_id<'a>(raw: &'a str, prefix: &str, kind: &str) -> Result<&'a str> {
    let id = raw.trim();
    let id = id.strip_prefix(prefix).unwrap_or(id);
    if id.is_empty() {
        return Err(ClientError::InvalidArgument(format!("empty {kind} id")));
    }
    Ok(id)
}

/// Token for the following page, or `None` when listing is done.
fn next_page(current: Option<&str>, next: Option<String>) -> Option<String> {
    let next = next.filter(|t| !t.is_empty())?;
    if current == Some(next.as_str()) {
        tracing::warn!(token = %next, "server repeated page token; stopping pagination");
        return None;
    }
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_strips_prefix() {
        assert_eq!(resource_id("sessions/123", "sessions/", "session").unwrap(), "123");
        assert_eq!(resource_id(" 123 ", "sessions/", "session").unwrap(), "123");
    }

    #[test]
    fn resource_id_rejects_blank() {
        let err = resource_id("  ", "sessions/", "session").unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: empty session id");
        assert!(resource_id("activities/", "activities/", "activity").is_err());
    }

    #[test]
    fn next_page_stops_on_empty_or_repeated_token() {
        assert_eq!(next_page(None, Some("p2".to_string())), Some("p2".to_string()));
        assert_eq!(next_page(None, Some(String::new())), None);
        assert_eq!(next_page(Some("p2"), Some("p2".to_string())), None);
        assert_eq!(next_page(Some("p2"), None), None);
    }
}
