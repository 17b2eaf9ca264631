//! Wire data model of the session API.

use serde::{Deserialize, Serialize};

pub use crate::context::{GitHubRepoContext, SourceContext};

/// Session identifier as assigned by the server.
pub type SessionId = String;

/// Activity identifier as assigned by the server.
pub type ActivityId = String;

/// A content origin a session operates against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Resource name, e.g. `sources/github/owner/repo`.
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    /// User-facing URL of the source.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub source_type: Option<String>,
    /// Repository metadata for GitHub-backed sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<GitHubRepo>,
}

/// GitHub repository metadata of a [`Source`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub default_branch: Option<GitHubBranch>,
    #[serde(default)]
    pub branches: Vec<GitHubBranch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubBranch {
    pub display_name: String,
}

impl Source {
    /// A source known only by its resource name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            create_time: None,
            update_time: None,
            url: None,
            source_type: None,
            github_repo: None,
        }
    }

    /// Label to show when listing sources.
    ///
    /// Prefers the URL, then `owner/repo`, then the resource name.
    #[must_use]
    pub fn display_label(&self) -> String {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }
        if let Some(repo) = &self.github_repo {
            return format!("{}/{}", repo.owner, repo.repo);
        }
        self.name.clone()
    }

    /// Default branch of the backing repository, if known.
    #[must_use]
    pub fn default_branch(&self) -> Option<&str> {
        self.github_repo
            .as_ref()
            .and_then(|repo| repo.default_branch.as_ref())
            .map(|branch| branch.display_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Server-defined session lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[default]
    StateUnspecified,
    Queued,
    Planning,
    AwaitingPlanApproval,
    AwaitingUserFeedback,
    InProgress,
    Paused,
    Completed,
    Failed,
    /// A state this SDK does not know about yet.
    #[serde(other)]
    Unknown,
}


/// One conversation bound to a source and an initial prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub name: String,
    pub id: SessionId,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub state: SessionState,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_context: Option<SourceContext>,
}

/// One server-recorded event within a session.
///
/// Activities are immutable; the client only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl Activity {
    /// Text rendered for this activity in a chat transcript.
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.description.trim().is_empty() {
            self.description.clone()
        } else if !self.prompt.trim().is_empty() {
            self.prompt.clone()
        } else {
            format!("Activity {}", self.id)
        }
    }
}

/// Body of a session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub prompt: String,
    pub source_context: SourceContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_plan_approval: Option<bool>,
}

impl CreateSessionRequest {
    /// Request a session for a source with the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>, source_context: SourceContext) -> Self {
        Self {
            prompt: prompt.into(),
            source_context,
            title: None,
            require_plan_approval: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn require_plan_approval(mut self, required: bool) -> Self {
        self.require_plan_approval = Some(required);
        self
    }
}

/// Server reply to a sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_parses_server_names() {
        let state: SessionState = serde_json::from_str("\"AWAITING_PLAN_APPROVAL\"").unwrap();
        assert_eq!(state, SessionState::AwaitingPlanApproval);

        let state: SessionState = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(state, SessionState::Unknown);
    }

    #[test]
    fn session_parses_minimal_payload() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "name": "sessions/123",
            "id": "123",
            "state": "IN_PROGRESS",
            "sourceContext": { "source": "sources/github/acme/widgets" }
        }))
        .unwrap();
        assert_eq!(session.id, "123");
        assert_eq!(session.state, SessionState::InProgress);
        assert_eq!(
            session.source_context.unwrap().source,
            "sources/github/acme/widgets"
        );
    }

    #[test]
    fn activity_summary_falls_back() {
        let mut activity = Activity {
            id: "a1".to_string(),
            name: String::new(),
            description: "Planned the change".to_string(),
            create_time: None,
            update_time: None,
            prompt: "fix the bug".to_string(),
            state: None,
        };
        assert_eq!(activity.summary(), "Planned the change");

        activity.description.clear();
        assert_eq!(activity.summary(), "fix the bug");

        activity.prompt = "  ".to_string();
        assert_eq!(activity.summary(), "Activity a1");
    }

    #[test]
    fn source_display_label_prefers_url() {
        let mut source: Source = serde_json::from_value(serde_json::json!({
            "name": "sources/github/acme/widgets",
            "id": "github/acme/widgets",
            "githubRepo": { "owner": "acme", "repo": "widgets" }
        }))
        .unwrap();
        assert_eq!(source.display_label(), "acme/widgets");

        source.url = Some("https://github.com/acme/widgets".to_string());
        assert_eq!(source.display_label(), "https://github.com/acme/widgets");
        assert_eq!(source.default_branch(), None);
    }

    #[test]
    fn create_session_request_skips_unset_fields() {
        let req = CreateSessionRequest::new("Test Application", SourceContext::new("sources/x"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "prompt": "Test Application",
                "sourceContext": { "source": "sources/x" }
            })
        );

        let json = serde_json::to_value(req.with_title("t").require_plan_approval(true)).unwrap();
        assert_eq!(json["title"], "t");
        assert_eq!(json["requirePlanApproval"], true);
    }
}
