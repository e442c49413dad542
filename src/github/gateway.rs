//! Gateways for listing open pull requests through Octocrab.
//!
//! The trait-based gateway lets the reminder pipeline run against mocks in
//! tests while the Octocrab implementation handles real HTTP requests.

use std::time::Duration;

use async_trait::async_trait;
use http::{StatusCode, Uri};
use octocrab::{Octocrab, Page};
use tracing::debug;

use super::error::IntakeError;
use super::models::{ApiPullRequest, OpenPullRequest};
use super::repository::{PersonalAccessToken, RepositoryRef};

/// Public GitHub API base used when no enterprise host is configured.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const PULLS_PER_PAGE: &str = "100";

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns `IntakeError::InvalidUrl` when the base URI cannot be parsed or
/// `IntakeError::Api` when Octocrab fails to construct a client.
fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
    timeout: Duration,
) -> Result<Octocrab, IntakeError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| IntakeError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .set_connect_timeout(Some(timeout))
        .set_read_timeout(Some(timeout))
        .base_uri(base_uri)
        .map_err(|error| IntakeError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}

/// Gateway that can list the open pull requests of a repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestGateway: Send + Sync {
    /// Fetch every open pull request of `repository`, following pagination.
    async fn open_pull_requests(
        &self,
        repository: &RepositoryRef,
    ) -> Result<Vec<OpenPullRequest>, IntakeError>;
}

/// Octocrab-backed gateway.
pub struct OctocrabGateway {
    client: Octocrab,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and API base URL.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidUrl` when the base URI cannot be parsed or
    /// `IntakeError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, IntakeError> {
        let octocrab = build_octocrab_client(token, api_base, timeout)?;
        Ok(Self::new(octocrab))
    }
}

#[async_trait]
impl PullRequestGateway for OctocrabGateway {
    async fn open_pull_requests(
        &self,
        repository: &RepositoryRef,
    ) -> Result<Vec<OpenPullRequest>, IntakeError> {
        let query_params = [("state", "open"), ("per_page", PULLS_PER_PAGE)];

        let first_page: Page<ApiPullRequest> = self
            .client
            .get(repository.pulls_path(), Some(&query_params))
            .await
            .map_err(|error| map_octocrab_error("list pulls", &error))?;

        let pull_requests: Vec<OpenPullRequest> = self
            .client
            .all_pages(first_page)
            .await
            .map(|items| items.into_iter().map(ApiPullRequest::into).collect())
            .map_err(|error| map_octocrab_error("list pulls", &error))?;

        debug!(
            repository = %repository,
            count = pull_requests.len(),
            "listed open pull requests"
        );
        Ok(pull_requests)
    }
}

// --- Error mapping helpers ---

/// Checks if a GitHub error status indicates an authentication failure.
const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> IntakeError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let status = source.status_code;
        let message = &source.message;
        return if is_rate_limit_error(source) {
            IntakeError::RateLimitExceeded {
                message: format!("{operation} failed: {message}"),
            }
        } else if is_auth_failure(status) {
            IntakeError::Authentication {
                message: format!("{operation} failed: GitHub returned {status} {message}"),
            }
        } else {
            IntakeError::Api {
                message: format!("{operation} failed with status {status}: {message}"),
            }
        };
    }

    if is_network_error(error) {
        return IntakeError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    IntakeError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
