//! Data models representing open pull requests and their requested reviewers.
//!
//! Types prefixed with `Api` are internal deserialisation targets that convert
//! into public domain types.

use serde::Deserialize;

/// An open pull request as seen by the reminder pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenPullRequest {
    /// Pull request number.
    pub number: u64,
    /// HTML URL for displaying to a user.
    pub html_url: Option<String>,
    /// Logins of the requested reviewers, in the order GitHub lists them.
    ///
    /// `None` marks a reviewer entry that carried no login.
    pub requested_reviewers: Vec<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) number: u64,
    pub(super) html_url: Option<String>,
    #[serde(default)]
    pub(super) requested_reviewers: Vec<ApiUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiUser {
    pub(super) login: Option<String>,
}

impl From<ApiPullRequest> for OpenPullRequest {
    fn from(value: ApiPullRequest) -> Self {
        Self {
            number: value.number,
            html_url: value.html_url,
            requested_reviewers: value
                .requested_reviewers
                .into_iter()
                .map(|user| user.login)
                .collect(),
        }
    }
}
