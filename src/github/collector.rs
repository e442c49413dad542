//! Collects review requests for a single repository.

use indexmap::IndexMap;
use tracing::debug;

use super::error::IntakeError;
use super::gateway::PullRequestGateway;
use super::models::OpenPullRequest;
use super::repository::RepositoryRef;

/// Reviewer login → URLs of the pull requests awaiting their review.
///
/// Logins iterate in the order they were first seen; URLs keep discovery
/// order and may repeat when the source data repeats.
pub type ReviewRequestMap = IndexMap<String, Vec<String>>;

/// Builds review request maps from a gateway.
pub struct ReviewRequestCollector<'client, Gateway>
where
    Gateway: PullRequestGateway + ?Sized,
{
    client: &'client Gateway,
}

impl<'client, Gateway> ReviewRequestCollector<'client, Gateway>
where
    Gateway: PullRequestGateway + ?Sized,
{
    /// Create a collector backed by the provided gateway.
    #[must_use]
    pub const fn new(client: &'client Gateway) -> Self {
        Self { client }
    }

    /// Lists the open pull requests of `repository` and groups their URLs by
    /// requested reviewer.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error when the listing call fails. Pull
    /// requests without a URL and reviewers without a login are skipped.
    pub async fn collect(&self, repository: &RepositoryRef) -> Result<ReviewRequestMap, IntakeError> {
        let pull_requests = self.client.open_pull_requests(repository).await?;
        let requests = group_by_reviewer(pull_requests);
        debug!(
            repository = %repository,
            reviewers = requests.len(),
            "collected review requests"
        );
        Ok(requests)
    }
}

/// Groups pull request URLs under each requested reviewer login.
#[must_use]
pub fn group_by_reviewer(pull_requests: Vec<OpenPullRequest>) -> ReviewRequestMap {
    let mut requests = ReviewRequestMap::new();
    for pull_request in pull_requests {
        let Some(url) = pull_request.html_url else {
            continue;
        };
        for login in pull_request.requested_reviewers.into_iter().flatten() {
            requests.entry(login).or_default().push(url.clone());
        }
    }
    requests
}
