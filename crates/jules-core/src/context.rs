//! Source context attached to a session.

use serde::{Deserialize, Serialize};

use crate::model::Source;

/// Generic source context for a session.
///
/// Maps origin-specific source metadata (for now, a GitHub repository and
/// its branch) into the shape the session API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContext {
    /// Resource name of the source, e.g. `sources/github/owner/repo`.
    pub source: String,

    /// Repository-specific settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo_context: Option<GitHubRepoContext>,
}

/// Repository-specific part of a [`SourceContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubRepoContext {
    /// Branch the agent starts working from.
    pub starting_branch: String,
}

impl SourceContext {
    /// Create a context that names a source and nothing else.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            github_repo_context: None,
        }
    }

    /// Create a context with a starting branch.
    #[must_use]
    pub fn with_branch(source: impl Into<String>, starting_branch: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            github_repo_context: Some(GitHubRepoContext {
                starting_branch: starting_branch.into(),
            }),
        }
    }

    /// Build the context for a fetched source.
    ///
    /// The repository's default branch, when known, becomes the starting branch.
    #[must_use]
    pub fn from_source(source: &Source) -> Self {
        match source.default_branch() {
            Some(branch) => Self::with_branch(source.name.clone(), branch),
            None => Self::new(source.name.clone()),
        }
    }

    /// Starting branch, if one is set.
    #[must_use]
    pub fn starting_branch(&self) -> Option<&str> {
        self.github_repo_context
            .as_ref()
            .map(|ctx| ctx.starting_branch.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GitHubBranch, GitHubRepo};

    fn repo_source(default_branch: Option<&str>) -> Source {
        Source {
            name: "sources/github/acme/widgets".to_string(),
            id: "github/acme/widgets".to_string(),
            github_repo: Some(GitHubRepo {
                owner: "acme".to_string(),
                repo: "widgets".to_string(),
                is_private: false,
                default_branch: default_branch.map(|b| GitHubBranch {
                    display_name: b.to_string(),
                }),
                branches: Vec::new(),
            }),
            ..Source::named("sources/github/acme/widgets")
        }
    }

    #[test]
    fn maps_default_branch_to_starting_branch() {
        let ctx = SourceContext::from_source(&repo_source(Some("main")));
        assert_eq!(ctx.source, "sources/github/acme/widgets");
        assert_eq!(ctx.starting_branch(), Some("main"));
    }

    #[test]
    fn omits_repo_context_without_branch() {
        let ctx = SourceContext::from_source(&repo_source(None));
        assert!(ctx.github_repo_context.is_none());

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, serde_json::json!({ "source": "sources/github/acme/widgets" }));
    }

    #[test]
    fn serializes_camel_case() {
        let ctx = SourceContext::with_branch("sources/x", "dev");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["githubRepoContext"]["startingBranch"], "dev");
    }
}
